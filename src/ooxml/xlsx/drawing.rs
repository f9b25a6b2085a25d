//! Images anchored to cells through the worksheet drawing layer.
//!
//! Chain: worksheet `<drawing r:id>` → worksheet rels → `xl/drawings/drawingN.xml`
//! → anchor `xdr:from` (col, row) + `a:blip r:embed` → drawing rels → media part.

use crate::common::xml::{append_text, attr_value};
use crate::ooxml::error::Result;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::xlsx::cell::CellRef;
use crate::ooxml::xlsx::worksheet::Worksheet;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One picture anchor read from a drawing part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingAnchor {
    /// Top-left anchor cell
    pub cell: CellRef,
    /// `r:embed` of the picture's blip
    pub embed_id: String,
}

/// Anchor cell → media partname, for one worksheet.
#[derive(Debug, Default, Clone)]
pub struct DrawingImageIndex {
    images: HashMap<CellRef, PackURI>,
}

impl DrawingImageIndex {
    /// Build the index for a worksheet. Drawings that cannot be read are
    /// logged and skipped; the index is best-effort.
    pub fn build(package: &OpcPackage, sheet_partname: &PackURI, worksheet: &Worksheet) -> Result<Self> {
        let mut index = Self::default();
        if worksheet.drawing_rel_ids().is_empty() {
            return Ok(index);
        }

        let sheet_rels = package.rels_for(sheet_partname)?;
        for r_id in worksheet.drawing_rel_ids() {
            let drawing_partname = match sheet_rels.target_partname(r_id) {
                Ok(partname) => partname,
                Err(e) => {
                    warn!(%r_id, error = %e, "worksheet drawing relationship is unresolvable");
                    continue;
                },
            };
            let Some(xml) = package.part(&drawing_partname) else {
                warn!(part = %drawing_partname, "drawing part is missing");
                continue;
            };

            let drawing_rels = package.rels_for(&drawing_partname)?;
            for anchor in parse_anchors(xml)? {
                match drawing_rels.target_partname(&anchor.embed_id) {
                    Ok(media) => {
                        index.images.entry(anchor.cell).or_insert(media);
                    },
                    Err(e) => {
                        warn!(cell = %anchor.cell, error = %e, "drawing image relationship is unresolvable");
                    },
                }
            }
        }

        debug!(anchored_images = index.images.len(), "built drawing image index");
        Ok(index)
    }

    /// Media partname of the picture anchored at `cell`.
    #[inline]
    pub fn get(&self, cell: CellRef) -> Option<&PackURI> {
        self.images.get(&cell)
    }

    /// All anchored pictures, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &PackURI)> {
        self.images.iter()
    }

    /// Last anchored row, 1-based.
    pub fn last_row(&self) -> Option<u32> {
        self.images.keys().map(|cell| cell.row).max()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Read the picture anchors of a drawing part, in document order.
///
/// Anchors without a `xdr:from` cell (absolute anchors) or without a blip
/// (charts, shapes) are skipped.
pub fn parse_anchors(xml: &[u8]) -> Result<Vec<DrawingAnchor>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut anchors = Vec::new();
    let mut in_anchor = false;
    let mut in_from = false;
    let mut field: Option<&'static str> = None;
    let mut text = String::new();
    let mut col: Option<u32> = None;
    let mut row: Option<u32> = None;
    let mut embed: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    in_anchor = true;
                    col = None;
                    row = None;
                    embed = None;
                },
                b"from" if in_anchor => in_from = true,
                b"col" if in_from => {
                    field = Some("col");
                    text.clear();
                },
                b"row" if in_from => {
                    field = Some("row");
                    text.clear();
                },
                b"blip" if in_anchor && embed.is_none() => {
                    embed = attr_value(e, b"embed");
                },
                _ => {},
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"col" | b"row" if field.is_some() => {
                    let value = text.trim().parse::<u32>().ok();
                    if field == Some("col") {
                        col = value;
                    } else {
                        row = value;
                    }
                    field = None;
                },
                b"from" => in_from = false,
                b"twoCellAnchor" | b"oneCellAnchor" => {
                    if let (Some(c), Some(r), Some(id)) = (col, row, embed.take()) {
                        anchors.push(DrawingAnchor {
                            cell: CellRef::new(c, r + 1),
                            embed_id: id,
                        });
                    }
                    in_anchor = false;
                },
                _ => {},
            },
            Event::Eof => break,
            _ => {
                if field.is_some() {
                    append_text(&mut text, &event);
                }
            },
        }
        buf.clear();
    }

    Ok(anchors)
}
