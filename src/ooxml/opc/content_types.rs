//! The `[Content_Types].xml` part.
//!
//! Presentations are rewritten in place: slides are dropped, new slides and
//! media are added, so the content type map must be both parsed and
//! re-serialized.

use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::{content_type as CT, namespace};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Content type map: extension defaults plus per-partname overrides.
#[derive(Debug, Clone, Default)]
pub struct ContentTypeMap {
    /// Lower-cased extension to content type
    defaults: BTreeMap<String, String>,
    /// Partname to content type
    overrides: BTreeMap<String, String>,
}

impl ContentTypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `[Content_Types].xml`.
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self::new();
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let mut key = None;
                    let mut content_type = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        match attr.key.as_ref() {
                            b"Extension" | b"PartName" => {
                                key = Some(attr.unescape_value()?.to_string())
                            },
                            b"ContentType" => {
                                content_type = Some(attr.unescape_value()?.to_string())
                            },
                            _ => {},
                        }
                    }

                    if let (Some(key), Some(ct)) = (key, content_type) {
                        match e.local_name().as_ref() {
                            b"Default" => map.add_default(&key, &ct),
                            b"Override" => map.add_override(&key, &ct),
                            _ => {},
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!(
                        "Content types parse error: {}",
                        e
                    )));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Register an extension default (case-insensitive).
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_ascii_lowercase(), content_type.to_string());
    }

    /// Register a partname override.
    pub fn add_override(&mut self, partname: &str, content_type: &str) {
        self.overrides
            .insert(partname.to_string(), content_type.to_string());
    }

    /// Drop the override for a partname, if any.
    pub fn remove_override(&mut self, partname: &str) -> Option<String> {
        self.overrides.remove(partname)
    }

    /// Make sure the extension of a media part has a default entry.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let ext = extension.to_ascii_lowercase();
        self.defaults
            .entry(ext)
            .or_insert_with(|| content_type.to_string());
    }

    /// Content type of a part: override first, then extension default.
    pub fn get(&self, partname: &PackURI) -> Option<&str> {
        self.overrides
            .get(partname.as_str())
            .or_else(|| self.defaults.get(&partname.ext().to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Partnames overriding to a given content type, in partname order.
    pub fn partnames_of_type(&self, content_type: &str) -> Vec<&str> {
        self.overrides
            .iter()
            .filter(|(_, ct)| ct.as_str() == content_type)
            .map(|(pn, _)| pn.as_str())
            .collect()
    }

    /// Serialize to `[Content_Types].xml`.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Types xmlns=""#);
        xml.push_str(namespace::OPC_CONTENT_TYPES);
        xml.push_str(r#"">"#);

        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(ct)
            ));
        }
        for (partname, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(ct)
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}

/// Base content type map every written package starts from.
pub fn base_content_types() -> ContentTypeMap {
    let mut map = ContentTypeMap::new();
    map.add_default("rels", CT::OPC_RELATIONSHIPS);
    map.add_default("xml", CT::XML);
    map
}
