use crate::common::xml::escape_xml;
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
/// Relationship parts (`.rels`) of an OPC package.
///
/// Every indirection this crate follows (sheet → drawing → media, rich value
/// → image, slide → layout) goes through a relationship collection, and every
/// slide it writes needs one.
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference as written in the `.rels` part.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Numeric part of the rId, if it follows the "rIdN" convention.
    #[inline]
    pub fn r_id_number(&self) -> Option<u32> {
        r_id_number(&self.r_id)
    }

    /// Get the absolute target partname for internal relationships.
    ///
    /// Returns an error if this is an external relationship.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} points outside the package",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Extract N from "rIdN".
pub fn r_id_number(r_id: &str) -> Option<u32> {
    let digits = r_id.strip_prefix("rId")?;
    atoi_simd::parse::<u32>(digits.as_bytes()).ok()
}

/// Collection of relationships from a single source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create a new empty relationships collection.
    ///
    /// # Arguments
    /// * `base_uri` - Directory of the source part, used to resolve targets
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            rels: HashMap::new(),
        }
    }

    /// Parse the XML of a `.rels` part.
    ///
    /// # Arguments
    /// * `base_uri` - Directory of the source part (not of the `.rels` part)
    /// * `xml` - Raw `.rels` content
    pub fn from_xml(base_uri: &str, xml: &[u8]) -> Result<Self> {
        let mut rels = Self::new(base_uri);
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut r_id = None;
                        let mut reltype = None;
                        let mut target_ref = None;
                        let mut is_external = false;

                        for attr in e.attributes() {
                            let attr = attr?;
                            match attr.key.as_ref() {
                                b"Id" => r_id = Some(attr.unescape_value()?.to_string()),
                                b"Type" => reltype = Some(attr.unescape_value()?.to_string()),
                                b"Target" => target_ref = Some(attr.unescape_value()?.to_string()),
                                b"TargetMode" => {
                                    is_external = attr.value.as_ref() == b"External";
                                },
                                _ => {},
                            }
                        }

                        if let (Some(id), Some(rt), Some(tr)) = (r_id, reltype, target_ref) {
                            rels.add_relationship(&rt, &tr, id, is_external);
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Add a relationship with an explicit rId, replacing any previous one
    /// with the same id.
    pub fn add_relationship(
        &mut self,
        reltype: &str,
        target_ref: &str,
        r_id: String,
        is_external: bool,
    ) {
        let rel = Relationship {
            r_id: r_id.clone(),
            reltype: reltype.to_string(),
            target_ref: target_ref.to_string(),
            base_uri: self.base_uri.clone(),
            is_external,
        };
        self.rels.insert(r_id, rel);
    }

    /// Add an internal relationship under the next free rId and return it.
    pub fn add(&mut self, reltype: &str, target_ref: &str) -> String {
        let r_id = format!("rId{}", self.max_r_id_number() + 1);
        self.add_relationship(reltype, target_ref, r_id.clone(), false);
        r_id
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Resolve an rId straight to its target partname.
    pub fn target_partname(&self, r_id: &str) -> Result<PackURI> {
        self.rels
            .get(r_id)
            .ok_or_else(|| OpcError::RelationshipNotFound(r_id.to_string()))?
            .target_partname()
    }

    /// First relationship of the given type, in rId order.
    pub fn first_of_type(&self, reltype: &str) -> Option<&Relationship> {
        self.sorted().into_iter().find(|rel| rel.reltype() == reltype)
    }

    /// Highest numeric rId in use, 0 when empty.
    pub fn max_r_id_number(&self) -> u32 {
        self.rels
            .values()
            .filter_map(Relationship::r_id_number)
            .max()
            .unwrap_or(0)
    }

    /// Relationships sorted by numeric rId (then lexically for odd ids).
    pub fn sorted(&self) -> Vec<&Relationship> {
        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by(|a, b| {
            a.r_id_number()
                .unwrap_or(u32::MAX)
                .cmp(&b.r_id_number().unwrap_or(u32::MAX))
                .then_with(|| a.r_id().cmp(b.r_id()))
        });
        rels
    }

    /// Get an iterator over all relationships (unordered).
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    /// Get the number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Remove a relationship by its ID.
    pub fn remove(&mut self, r_id: &str) -> Option<Relationship> {
        self.rels.remove(r_id)
    }

    /// Keep only the relationships matching the predicate.
    pub fn retain<F: FnMut(&Relationship) -> bool>(&mut self, mut keep: F) {
        self.rels.retain(|_, rel| keep(rel));
    }

    /// Serialize relationships to `.rels` XML, sorted by rId.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(r#"<Relationships xmlns=""#);
        xml.push_str(namespace::OPC_RELATIONSHIPS);
        xml.push_str(r#"">"#);

        for rel in self.sorted() {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };

            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(rel.r_id()),
                escape_xml(rel.reltype()),
                escape_xml(rel.target_ref()),
                target_mode
            ));
        }

        xml.push_str("</Relationships>");

        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as RT;

    const DRAWING_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image2.png"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.jpeg"/>
  <Relationship Id="rId10" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_and_resolve() {
        let rels = Relationships::from_xml("/xl/drawings", DRAWING_RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 3);
        assert_eq!(
            rels.target_partname("rId1").unwrap().as_str(),
            "/xl/media/image1.jpeg"
        );
        assert!(rels.get("rId10").unwrap().is_external());
        assert!(rels.target_partname("rId10").is_err());
        assert!(matches!(
            rels.target_partname("rId99"),
            Err(OpcError::RelationshipNotFound(_))
        ));
        assert_eq!(rels.max_r_id_number(), 10);
        assert_eq!(rels.first_of_type(RT::IMAGE).unwrap().r_id(), "rId1");
    }

    #[test]
    fn test_add_and_serialize_in_numeric_order() {
        let mut rels = Relationships::new("/ppt/slides");
        rels.add_relationship(RT::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml", "rId1".into(), false);
        for _ in 0..10 {
            rels.add(RT::IMAGE, "../media/image.png");
        }
        assert_eq!(rels.max_r_id_number(), 11);

        let xml = rels.to_xml();
        let pos2 = xml.find(r#"Id="rId2""#).unwrap();
        let pos10 = xml.find(r#"Id="rId10""#).unwrap();
        assert!(pos2 < pos10);

        let reparsed = Relationships::from_xml("/ppt/slides", xml.as_bytes()).unwrap();
        assert_eq!(reparsed.len(), 11);
    }

    #[test]
    fn test_retain() {
        let mut rels = Relationships::from_xml("/xl/drawings", DRAWING_RELS.as_bytes()).unwrap();
        rels.retain(|rel| !rel.is_external());
        assert_eq!(rels.len(), 2);
        assert!(rels.remove("rId1").is_some());
        assert_eq!(rels.len(), 1);
    }
}
