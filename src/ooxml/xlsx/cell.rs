//! Cell references and cell values as stored in worksheet XML.

use std::fmt;

/// A cell reference such as `B12`.
///
/// Columns are zero-based (`A` = 0) to match drawing anchors (`xdr:from`),
/// rows are one-based to match the `r` attribute of worksheet XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    /// Column index (0-based)
    pub column: u32,
    /// Row number (1-based)
    pub row: u32,
}

impl CellRef {
    pub fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Parse a reference like "AA10". `$` markers are ignored.
    pub fn parse(reference: &str) -> Option<Self> {
        let bytes = reference.as_bytes();
        let mut column = 0u32;
        let mut letters = 0usize;
        let mut pos = 0usize;

        while pos < bytes.len() {
            let b = bytes[pos];
            if b == b'$' {
                pos += 1;
                continue;
            }
            if !b.is_ascii_alphabetic() {
                break;
            }
            column = column
                .checked_mul(26)?
                .checked_add((b.to_ascii_uppercase() - b'A') as u32 + 1)?;
            letters += 1;
            pos += 1;
        }

        if letters == 0 {
            return None;
        }
        let digits = reference[pos..].trim_start_matches('$');
        let row = atoi_simd::parse::<u32>(digits.as_bytes()).ok()?;
        if row == 0 {
            return None;
        }
        Some(Self::new(column - 1, row))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.column), self.row)
    }
}

/// Convert a zero-based column index to letters (0 -> "A", 26 -> "AA").
pub fn column_to_letters(index: u32) -> String {
    let mut letters = Vec::new();
    let mut n = index as u64 + 1;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert column letters to a zero-based index ("A" -> 0, "AA" -> 26).
///
/// Returns `None` unless the input is one to three ASCII letters, the width
/// of the largest sheet Excel allows.
pub fn letters_to_column(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let mut column = 0u32;
    for b in letters.bytes() {
        column = column * 26 + (b.to_ascii_uppercase() - b'A') as u32 + 1;
    }
    Some(column - 1)
}

/// Value of a worksheet cell, before shared-string lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value
    Empty,
    /// Index into the shared strings table (`t="s"`)
    SharedString(usize),
    /// Literal text (`t="inlineStr"` or `t="str"`)
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value (`t="b"`)
    Boolean(bool),
    /// Error value such as `#N/A` (`t="e"`)
    Error(String),
}

impl CellValue {
    /// Build a value from the cell type attribute and the raw `<v>` text.
    pub fn from_raw(cell_type: Option<&str>, raw: &str) -> Self {
        match cell_type {
            Some("s") => atoi_simd::parse::<usize>(raw.trim().as_bytes())
                .map(CellValue::SharedString)
                .unwrap_or(CellValue::Empty),
            Some("b") => CellValue::Boolean(raw.trim() == "1"),
            Some("e") => CellValue::Error(raw.to_string()),
            Some("str") | Some("inlineStr") => CellValue::Text(raw.to_string()),
            _ => match fast_float2::parse::<f64, _>(raw.trim()) {
                Ok(n) => CellValue::Number(n),
                Err(_) if raw.trim().is_empty() => CellValue::Empty,
                Err(_) => CellValue::Text(raw.to_string()),
            },
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// Render a number the way a spreadsheet shows it in a general cell:
/// integral values without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(n as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(n).to_string()
    }
}

/// A parsed worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub reference: CellRef,
    pub value: CellValue,
    /// Value metadata index (`vm` attribute, 1-based); set for rich-data
    /// images pasted into the cell
    pub value_metadata: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference() {
        assert_eq!(CellRef::parse("A1"), Some(CellRef::new(0, 1)));
        assert_eq!(CellRef::parse("b12"), Some(CellRef::new(1, 12)));
        assert_eq!(CellRef::parse("AA10"), Some(CellRef::new(26, 10)));
        assert_eq!(CellRef::parse("$C$3"), Some(CellRef::new(2, 3)));
        assert_eq!(CellRef::parse("12"), None);
        assert_eq!(CellRef::parse("A0"), None);
        assert_eq!(CellRef::parse("A"), None);
    }

    #[test]
    fn test_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(701), "ZZ");
        assert_eq!(column_to_letters(702), "AAA");
        assert_eq!(letters_to_column("a"), Some(0));
        assert_eq!(letters_to_column("AB"), Some(27));
        assert_eq!(letters_to_column("Name"), None);
        assert_eq!(letters_to_column("A1"), None);
        assert_eq!(CellRef::new(27, 4).to_string(), "AB4");
    }

    #[test]
    fn test_values() {
        assert_eq!(CellValue::from_raw(Some("s"), "3"), CellValue::SharedString(3));
        assert_eq!(CellValue::from_raw(Some("b"), "1"), CellValue::Boolean(true));
        assert_eq!(CellValue::from_raw(None, "2.5"), CellValue::Number(2.5));
        assert_eq!(CellValue::from_raw(None, ""), CellValue::Empty);
        assert_eq!(CellValue::from_raw(Some("e"), "#N/A"), CellValue::Error("#N/A".into()));
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.25), "0.25");
    }
}
