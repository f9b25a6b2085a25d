//! Shared strings table (`xl/sharedStrings.xml`).
//!
//! Rich-text entries (`<si><r><t>..</t></r>..</si>`) are flattened to their
//! plain text; phonetic hints (`<rPh>`) are skipped.

use crate::common::xml::append_text;
use crate::ooxml::error::Result;
use quick_xml::Reader;
use quick_xml::events::Event;

/// Shared strings table.
#[derive(Debug, Default, Clone)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    /// Create a new empty shared strings table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse shared strings from `xl/sharedStrings.xml` content.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut strings = Vec::new();
        let mut current: Option<String> = None;
        let mut in_text = false;
        let mut phonetic_depth = 0usize;
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf)?;
            match &event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"si" => current = Some(String::new()),
                    b"rPh" => phonetic_depth += 1,
                    b"t" => in_text = phonetic_depth == 0,
                    _ => {},
                },
                Event::Empty(e) if e.local_name().as_ref() == b"si" => {
                    strings.push(String::new());
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"si" => {
                        if let Some(s) = current.take() {
                            strings.push(s);
                        }
                    },
                    b"rPh" => phonetic_depth = phonetic_depth.saturating_sub(1),
                    b"t" => in_text = false,
                    _ => {},
                },
                Event::Eof => break,
                _ => {
                    if in_text && let Some(s) = current.as_mut() {
                        append_text(s, &event);
                    }
                },
            }
            buf.clear();
        }

        Ok(Self { strings })
    }

    /// Get a string by its index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Get the number of strings in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_rich_entries() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4">
  <si><t>Product</t></si>
  <si><r><rPr><b/></rPr><t>Bold</t></r><r><t xml:space="preserve"> tail</t></r></si>
  <si/>
  <si><t>Caf&#233; &amp; Bar</t><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
</sst>"#;
        let sst = SharedStrings::parse(xml).unwrap();
        assert_eq!(sst.len(), 4);
        assert_eq!(sst.get(0), Some("Product"));
        assert_eq!(sst.get(1), Some("Bold tail"));
        assert_eq!(sst.get(2), Some(""));
        assert_eq!(sst.get(3), Some("Café & Bar"));
        assert_eq!(sst.get(4), None);
    }
}
