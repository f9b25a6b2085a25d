//! Tabulation: the worksheet as a header row plus data rows.

use crate::common::{Error, Result};
use crate::deck::config::SlideLayoutConfig;
use crate::deck::row::{ColumnContentMap, RowRecord};
use crate::ooxml::xlsx::Workbook;
use crate::ooxml::xlsx::cell::{CellRef, letters_to_column};
use tracing::{info, warn};

/// Default cap on sanitized cell text, in characters.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Reads row records from the bound worksheet of a workbook.
///
/// The first row holding any cell is the header row; every row after it,
/// up to the last row with a cell or an anchored picture, is a data row.
#[derive(Debug)]
pub struct RowSource<'a> {
    workbook: &'a Workbook,
    header_row: u32,
    /// Header text per column index; gaps are empty strings
    headers: Vec<String>,
}

impl<'a> RowSource<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        let header_row = workbook.worksheet().first_row().unwrap_or(1);
        let mut headers: Vec<String> = Vec::new();
        for cell in workbook.worksheet().row(header_row) {
            let column = cell.reference.column as usize;
            if headers.len() <= column {
                headers.resize(column + 1, String::new());
            }
            headers[column] = workbook.cell_text(cell.reference).trim().to_string();
        }
        Self {
            workbook,
            header_row,
            headers,
        }
    }

    #[inline]
    pub fn header_row(&self) -> u32 {
        self.header_row
    }

    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Column index of a reference: exact header name, case-insensitive
    /// header name, column letters (`A`, `AB`), or a zero-based index.
    /// Letters and indices must fall inside the header row.
    pub fn resolve_column(&self, reference: &str) -> Option<u32> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        if let Some(i) = self.headers.iter().position(|h| h == reference) {
            return Some(i as u32);
        }
        if let Some(i) = self.headers.iter().position(|h| h.eq_ignore_ascii_case(reference)) {
            return Some(i as u32);
        }

        let width = self.headers.len() as u32;
        if reference.len() <= 2
            && let Some(column) = letters_to_column(reference)
        {
            return (column < width).then_some(column);
        }
        match atoi_simd::parse::<u32>(reference.as_bytes()) {
            Ok(index) if index < width => Some(index),
            _ => None,
        }
    }

    /// Like [`resolve_column`](Self::resolve_column), but a missing column
    /// is an error.
    pub fn require_column(&self, reference: &str) -> Result<u32> {
        self.resolve_column(reference)
            .ok_or_else(|| Error::ColumnNotFound(reference.to_string()))
    }

    /// One-based worksheet rows holding data, in order.
    pub fn data_rows(&self) -> std::ops::RangeInclusive<u32> {
        let last = self.workbook.last_row().unwrap_or(self.header_row);
        self.header_row + 1..=last
    }

    /// Read the text columns of every data row.
    ///
    /// Texts are keyed by the column identifiers as configured, in the
    /// configured order; empty cells yield empty strings. Image columns are
    /// checked here but resolved separately.
    pub fn read(&self, config: &SlideLayoutConfig) -> Result<Vec<RowRecord>> {
        let text_columns: Vec<(String, u32)> = config
            .all_text_columns()
            .into_iter()
            .map(|c| self.require_column(&c).map(|i| (c, i)))
            .collect::<Result<_>>()?;
        for column in config.image_columns() {
            self.require_column(&column)?;
        }

        let mut sheet_rows: Vec<u32> = self.data_rows().collect();
        if sheet_rows.len() > config.max_rows {
            warn!(
                rows = sheet_rows.len(),
                max_rows = config.max_rows,
                "worksheet has too many rows, truncating"
            );
            sheet_rows.truncate(config.max_rows);
        }

        let rows: Vec<RowRecord> = sheet_rows
            .into_iter()
            .enumerate()
            .map(|(row_index, sheet_row)| {
                let texts: ColumnContentMap = text_columns
                    .iter()
                    .map(|(name, column)| {
                        let raw = self.workbook.cell_text(CellRef::new(*column, sheet_row));
                        (name.clone(), sanitize_text(&raw, MAX_TEXT_LENGTH))
                    })
                    .collect();
                RowRecord::new(row_index, sheet_row, texts)
            })
            .collect();

        info!(
            sheet = self.workbook.sheet_name(),
            rows = rows.len(),
            columns = text_columns.len(),
            "read worksheet rows"
        );
        Ok(rows)
    }
}

/// Clean cell text for a slide.
///
/// Control characters other than newline, carriage return and tab are
/// removed, runs of spaces and tabs collapse to one space, more than two
/// consecutive newlines collapse to two, text longer than `max_length`
/// characters is cut and marked with `...`, and the result is trimmed.
pub fn sanitize_text(text: &str, max_length: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    let mut newlines = 0usize;

    for c in text.chars() {
        let code = c as u32;
        if (code < 0x20 && !matches!(c, '\n' | '\r' | '\t')) || (0x7f..=0x9f).contains(&code) {
            continue;
        }
        match c {
            ' ' | '\t' => {
                if !blank_run {
                    out.push(' ');
                }
                blank_run = true;
                newlines = 0;
            },
            '\n' => {
                newlines += 1;
                blank_run = false;
                if newlines <= 2 {
                    out.push('\n');
                }
            },
            _ => {
                blank_run = false;
                newlines = 0;
                out.push(c);
            },
        }
    }

    if let Some((cut, _)) = out.char_indices().nth(max_length) {
        warn!(max_length, "cell text truncated");
        out.truncate(cut);
        out.push_str("...");
    }

    out.trim().to_string()
}
