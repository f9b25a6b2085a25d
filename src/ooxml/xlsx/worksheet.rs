//! Worksheet part parsing.
//!
//! Only what the deck pipeline reads is kept: cell values, the `vm`
//! value-metadata attribute of each cell, and the relationship ids of the
//! sheet's drawing parts.

use crate::common::xml::{append_text, attr_value};
use crate::ooxml::error::Result;
use crate::ooxml::xlsx::cell::{Cell, CellRef, CellValue};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;

/// A parsed worksheet.
#[derive(Debug, Default, Clone)]
pub struct Worksheet {
    /// Cells keyed by (row, column) so iteration is row-major
    cells: BTreeMap<(u32, u32), Cell>,
    /// `r:id` of each `<drawing>` element
    drawing_rel_ids: Vec<String>,
}

/// Cell being accumulated between `<c>` and `</c>`.
struct PendingCell {
    reference: CellRef,
    cell_type: Option<String>,
    value_metadata: Option<u32>,
    raw: String,
    has_value: bool,
}

impl Worksheet {
    /// Parse `xl/worksheets/sheetN.xml`.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut sheet = Worksheet::default();
        let mut current_row = 0u32;
        let mut next_column = 0u32;
        let mut pending: Option<PendingCell> = None;
        let mut in_value = false;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf)?;
            match &event {
                Event::Start(e) | Event::Empty(e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    match e.local_name().as_ref() {
                        b"row" => {
                            current_row = attr_value(e, b"r")
                                .and_then(|r| r.parse::<u32>().ok())
                                .unwrap_or(current_row + 1);
                            next_column = 0;
                        },
                        b"c" => {
                            let cell = Self::start_cell(e, current_row, next_column);
                            next_column = cell.reference.column + 1;
                            if is_empty {
                                sheet.finish_cell(cell);
                            } else {
                                pending = Some(cell);
                            }
                        },
                        b"v" | b"t" if !is_empty && pending.is_some() => {
                            in_value = true;
                            if let Some(cell) = pending.as_mut() {
                                cell.has_value = true;
                            }
                        },
                        b"drawing" => {
                            if let Some(r_id) = attr_value(e, b"id") {
                                sheet.drawing_rel_ids.push(r_id);
                            }
                        },
                        _ => {},
                    }
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"t" => in_value = false,
                    b"c" => {
                        if let Some(cell) = pending.take() {
                            sheet.finish_cell(cell);
                        }
                    },
                    _ => {},
                },
                Event::Eof => break,
                _ => {
                    if in_value && let Some(cell) = pending.as_mut() {
                        append_text(&mut cell.raw, &event);
                    }
                },
            }
            buf.clear();
        }

        Ok(sheet)
    }

    fn start_cell(e: &BytesStart<'_>, row: u32, column: u32) -> PendingCell {
        let reference = attr_value(e, b"r")
            .and_then(|r| CellRef::parse(&r))
            .unwrap_or_else(|| CellRef::new(column, row.max(1)));
        PendingCell {
            reference,
            cell_type: attr_value(e, b"t"),
            value_metadata: attr_value(e, b"vm").and_then(|vm| vm.parse::<u32>().ok()),
            raw: String::new(),
            has_value: false,
        }
    }

    fn finish_cell(&mut self, pending: PendingCell) {
        let value = if pending.has_value {
            CellValue::from_raw(pending.cell_type.as_deref(), &pending.raw)
        } else {
            CellValue::Empty
        };
        if value.is_empty() && pending.value_metadata.is_none() {
            return;
        }
        let reference = pending.reference;
        self.cells.insert(
            (reference.row, reference.column),
            Cell {
                reference,
                value,
                value_metadata: pending.value_metadata,
            },
        );
    }

    /// Look up a cell.
    #[inline]
    pub fn cell(&self, reference: CellRef) -> Option<&Cell> {
        self.cells.get(&(reference.row, reference.column))
    }

    /// All non-empty cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Cells of one row, left to right.
    pub fn row(&self, row: u32) -> impl Iterator<Item = &Cell> {
        self.cells
            .range((row, 0)..=(row, u32::MAX))
            .map(|(_, cell)| cell)
    }

    /// First row holding any cell.
    pub fn first_row(&self) -> Option<u32> {
        self.cells.keys().next().map(|(row, _)| *row)
    }

    /// Last row holding any cell.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.keys().next_back().map(|(row, _)| *row)
    }

    /// Relationship ids of the sheet's drawing parts.
    #[inline]
    pub fn drawing_rel_ids(&self) -> &[String] {
        &self.drawing_rel_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t>Price</t></is></c></row>
    <row r="2"><c r="A2" t="e" vm="1"><v>#VALUE!</v></c><c r="B2" t="s"><v>2</v></c><c r="C2"><v>12.5</v></c></row>
    <row><c t="str"><f>A1</f><v>Tom &amp; Co</v></c><c/><c r="D3" t="b"><v>1</v></c></row>
  </sheetData>
  <drawing r:id="rId3"/>
</worksheet>"#;

    #[test]
    fn test_parse_cells() {
        let ws = Worksheet::parse(SHEET.as_bytes()).unwrap();
        assert_eq!(ws.first_row(), Some(1));
        assert_eq!(ws.last_row(), Some(3));

        assert_eq!(
            ws.cell(CellRef::new(2, 1)).unwrap().value,
            CellValue::Text("Price".into())
        );
        let image_cell = ws.cell(CellRef::new(0, 2)).unwrap();
        assert_eq!(image_cell.value_metadata, Some(1));
        assert_eq!(ws.cell(CellRef::new(2, 2)).unwrap().value, CellValue::Number(12.5));

        // Row and column inferred when r attributes are missing
        assert_eq!(
            ws.cell(CellRef::new(0, 3)).unwrap().value,
            CellValue::Text("Tom & Co".into())
        );
        assert!(ws.cell(CellRef::new(1, 3)).is_none());
        assert_eq!(ws.cell(CellRef::new(3, 3)).unwrap().value, CellValue::Boolean(true));
        assert_eq!(ws.row(2).count(), 3);
        assert_eq!(ws.drawing_rel_ids(), ["rId3".to_string()]);
    }
}
