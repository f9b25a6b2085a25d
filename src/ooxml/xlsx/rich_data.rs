//! Images pasted into cells ("place in cell"), stored as rich values.
//!
//! Such a cell carries only a `vm` attribute. Reaching the picture takes two
//! explicit stages:
//!
//! 1. **value slot**: `vm` (1-based) → `xl/metadata.xml` `valueMetadata`
//!    block → `rc@v` → `futureMetadata[XLRICHVALUE]` block → `xlrd:rvb@i`
//!    (rich value index) → `xl/richData/rdrichvalue.xml` `rv` → the value at
//!    the `_rvRel:LocalImageIdentifier` key position of the rich value's
//!    structure (`rdrichvaluestructure.xml`) = relationship slot.
//! 2. **relationship slot** → `xl/richData/richValueRel.xml` `rel@r:id` →
//!    `xl/richData/_rels/richValueRel.xml.rels` → media partname.
//!
//! Workbooks written by older tools may lack the metadata parts. Stage 1
//! then assumes slot = `vm - 1`; when the `rel` list is missing, stage 2
//! assumes slot *n* is `rId{n+1}`.

use crate::common::xml::{append_text, attr_value};
use crate::ooxml::error::Result;
use crate::ooxml::opc::{OpcPackage, PackURI};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use tracing::debug;

pub const METADATA_PART: &str = "/xl/metadata.xml";
pub const RICH_VALUE_PART: &str = "/xl/richData/rdrichvalue.xml";
pub const RICH_VALUE_STRUCTURE_PART: &str = "/xl/richData/rdrichvaluestructure.xml";
pub const RICH_VALUE_REL_PART: &str = "/xl/richData/richValueRel.xml";

const LOCAL_IMAGE_KEY: &str = "_rvRel:LocalImageIdentifier";
const RICH_VALUE_METADATA_TYPE: &str = "XLRICHVALUE";

/// Stage 1: value metadata index → relationship slot.
#[derive(Debug, Clone, Default)]
pub enum ValueSlotTable {
    /// No metadata parts: slot = vm - 1
    #[default]
    Positional,
    /// Resolved through metadata and rich value parts
    Resolved(HashMap<u32, u32>),
}

impl ValueSlotTable {
    /// Relationship slot of a 1-based `vm`.
    pub fn slot(&self, vm: u32) -> Option<u32> {
        match self {
            ValueSlotTable::Positional => vm.checked_sub(1),
            ValueSlotTable::Resolved(map) => map.get(&vm).copied(),
        }
    }
}

/// Two-stage rich-data image index for one workbook.
#[derive(Debug, Clone, Default)]
pub struct RichDataImageIndex {
    /// Stage 1
    slots: ValueSlotTable,
    /// Stage 2: relationship slot → media partname
    media: HashMap<u32, PackURI>,
}

impl RichDataImageIndex {
    /// Build the index from a workbook package. A workbook without rich data
    /// yields an empty index.
    pub fn build(package: &OpcPackage) -> Result<Self> {
        let slots = Self::build_slot_table(package)?;
        let media = Self::build_media_table(package)?;
        debug!(
            images = media.len(),
            positional = matches!(slots, ValueSlotTable::Positional),
            "built rich data image index"
        );
        Ok(Self { slots, media })
    }

    /// Build directly from the two stages.
    pub fn from_stages(slots: ValueSlotTable, media: HashMap<u32, PackURI>) -> Self {
        Self { slots, media }
    }

    /// Media partname for a cell's 1-based `vm` attribute.
    pub fn lookup(&self, vm: u32) -> Option<&PackURI> {
        self.slots.slot(vm).and_then(|slot| self.media.get(&slot))
    }

    #[inline]
    pub fn slots(&self) -> &ValueSlotTable {
        &self.slots
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    fn build_slot_table(package: &OpcPackage) -> Result<ValueSlotTable> {
        let metadata = package.part(&PackURI::from_membername(METADATA_PART));
        let values = package.part(&PackURI::from_membername(RICH_VALUE_PART));
        let (Some(metadata), Some(values)) = (metadata, values) else {
            return Ok(ValueSlotTable::Positional);
        };

        let value_blocks = parse_value_metadata(metadata)?;
        let rich_values = parse_rich_values(values)?;
        let key_positions = match package.part(&PackURI::from_membername(RICH_VALUE_STRUCTURE_PART)) {
            Some(xml) => parse_structure_key_positions(xml)?,
            None => Vec::new(),
        };

        let mut map = HashMap::new();
        for (block, rich_value_index) in value_blocks.iter().enumerate() {
            let Some(rv) = rich_value_index.and_then(|i| rich_values.get(i as usize)) else {
                continue;
            };
            let position = rv
                .structure
                .and_then(|s| key_positions.get(s as usize).copied().flatten())
                .unwrap_or(0);
            if let Some(slot) = rv.values.get(position).and_then(|v| v.trim().parse::<u32>().ok()) {
                map.insert(block as u32 + 1, slot);
            }
        }
        Ok(ValueSlotTable::Resolved(map))
    }

    fn build_media_table(package: &OpcPackage) -> Result<HashMap<u32, PackURI>> {
        let rel_part = PackURI::from_membername(RICH_VALUE_REL_PART);
        let rels = package.rels_for(&rel_part)?;
        let mut media = HashMap::new();
        if rels.is_empty() {
            return Ok(media);
        }

        match package.part(&rel_part) {
            Some(xml) => {
                for (slot, r_id) in parse_rel_list(xml)?.into_iter().enumerate() {
                    if let Ok(target) = rels.target_partname(&r_id) {
                        media.insert(slot as u32, target);
                    }
                }
            },
            None => {
                for rel in rels.iter() {
                    if let (Some(n), Ok(target)) = (rel.r_id_number(), rel.target_partname())
                        && n > 0
                    {
                        media.insert(n - 1, target);
                    }
                }
            },
        }
        Ok(media)
    }
}

/// Parse `xl/metadata.xml` into, per `valueMetadata` block (index = vm - 1),
/// the rich value index it refers to.
fn parse_value_metadata(xml: &[u8]) -> Result<Vec<Option<u32>>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut metadata_types: Vec<String> = Vec::new();
    // futureMetadata blocks of the XLRICHVALUE type → rich value index
    let mut future_blocks: Vec<Option<u32>> = Vec::new();
    // valueMetadata blocks → (metadata type, index into future blocks)
    let mut value_blocks: Vec<Option<(u32, u32)>> = Vec::new();

    let mut in_future = false;
    let mut in_value_metadata = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"metadataType" => {
                    metadata_types.push(attr_value(e, b"name").unwrap_or_default());
                },
                b"futureMetadata" => {
                    in_future = attr_value(e, b"name").as_deref() == Some(RICH_VALUE_METADATA_TYPE);
                },
                b"valueMetadata" => in_value_metadata = true,
                b"bk" if in_future => future_blocks.push(None),
                b"bk" if in_value_metadata => value_blocks.push(None),
                b"rvb" if in_future => {
                    if let Some(last) = future_blocks.last_mut() {
                        *last = attr_value(e, b"i").and_then(|i| i.parse().ok());
                    }
                },
                b"rc" if in_value_metadata => {
                    let t = attr_value(e, b"t").and_then(|t| t.parse::<u32>().ok());
                    let v = attr_value(e, b"v").and_then(|v| v.parse::<u32>().ok());
                    if let (Some(last), Some(t), Some(v)) = (value_blocks.last_mut(), t, v)
                        && last.is_none()
                    {
                        *last = Some((t, v));
                    }
                },
                _ => {},
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"futureMetadata" => in_future = false,
                b"valueMetadata" => in_value_metadata = false,
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(value_blocks
        .into_iter()
        .map(|record| {
            let (t, v) = record?;
            // `t` is a 1-based index into metadataTypes; only rich values count
            let is_rich = metadata_types
                .get(t.checked_sub(1)? as usize)
                .is_none_or(|name| name == RICH_VALUE_METADATA_TYPE);
            if !is_rich {
                return None;
            }
            future_blocks.get(v as usize).copied().flatten()
        })
        .collect())
}

/// A rich value record: its structure index and positional values.
#[derive(Debug, Clone, Default)]
struct RichValue {
    structure: Option<u32>,
    values: Vec<String>,
}

fn parse_rich_values(xml: &[u8]) -> Result<Vec<RichValue>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut values = Vec::new();
    let mut current: Option<RichValue> = None;
    let mut in_v = false;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"rv" => {
                    current = Some(RichValue {
                        structure: attr_value(e, b"s").and_then(|s| s.parse().ok()),
                        values: Vec::new(),
                    });
                },
                b"v" => {
                    if let Some(rv) = current.as_mut() {
                        rv.values.push(String::new());
                        in_v = true;
                    }
                },
                _ => {},
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"rv" => values.push(RichValue {
                    structure: attr_value(e, b"s").and_then(|s| s.parse().ok()),
                    values: Vec::new(),
                }),
                b"v" => {
                    if let Some(rv) = current.as_mut() {
                        rv.values.push(String::new());
                    }
                },
                _ => {},
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"rv" => {
                    if let Some(rv) = current.take() {
                        values.push(rv);
                    }
                },
                _ => {},
            },
            Event::Eof => break,
            _ => {
                if in_v && let Some(last) = current.as_mut().and_then(|rv| rv.values.last_mut()) {
                    append_text(last, &event);
                }
            },
        }
        buf.clear();
    }

    Ok(values)
}

/// Position of the local-image key within each structure, by structure index.
fn parse_structure_key_positions(xml: &[u8]) -> Result<Vec<Option<usize>>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut positions = Vec::new();
    let mut key_count = 0usize;
    let mut in_structure = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"s" => {
                positions.push(None);
                key_count = 0;
                in_structure = true;
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"s" => positions.push(None),
            Event::Start(ref e) | Event::Empty(ref e)
                if in_structure && e.local_name().as_ref() == b"k" =>
            {
                if attr_value(e, b"n").as_deref() == Some(LOCAL_IMAGE_KEY)
                    && let Some(last) = positions.last_mut()
                    && last.is_none()
                {
                    *last = Some(key_count);
                }
                key_count += 1;
            },
            Event::End(ref e) if e.local_name().as_ref() == b"s" => in_structure = false,
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(positions)
}

/// The ordered `rel@r:id` list of `richValueRel.xml`.
fn parse_rel_list(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut ids = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"rel" => {
                ids.push(attr_value(e, b"id").unwrap_or_default());
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(ids)
}
