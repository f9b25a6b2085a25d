//! Shared XML helpers for reading and writing package parts.

pub mod escape;

pub use escape::{escape_xml, resolve_entity, unescape_xml};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::ops::Range;

/// Byte span of one element inside a larger document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpan {
    /// Local name (prefix stripped)
    pub name: Vec<u8>,
    /// From `<` of the start tag to `>` of the end tag
    pub outer: Range<usize>,
    /// Content between the tags; `None` for self-closing elements
    pub inner: Option<Range<usize>>,
}

impl ElementSpan {
    #[inline]
    pub fn is(&self, local: &[u8]) -> bool {
        self.name == local
    }
}

/// Locate the first element with local name `parent` and the spans of its
/// direct children, in document order.
///
/// Spans index into `xml`, so callers can splice the document without
/// re-serializing untouched markup. Returns `Ok(None)` when no such element
/// exists.
pub fn find_children(xml: &[u8], parent: &[u8]) -> quick_xml::Result<Option<(ElementSpan, Vec<ElementSpan>)>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut depth = 0usize;
    let mut parent_depth: Option<usize> = None;
    let mut parent_start = 0usize;
    let mut parent_inner = 0usize;
    let mut open_child: Option<(Vec<u8>, usize, usize)> = None;
    let mut children = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event()?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                depth += 1;
                match parent_depth {
                    None if e.local_name().as_ref() == parent => {
                        parent_depth = Some(depth);
                        parent_start = before;
                        parent_inner = after;
                    },
                    Some(pd) if depth == pd + 1 => {
                        open_child = Some((e.local_name().as_ref().to_vec(), before, after));
                    },
                    _ => {},
                }
            },
            Event::Empty(e) => match parent_depth {
                None if e.local_name().as_ref() == parent => {
                    let span = ElementSpan {
                        name: parent.to_vec(),
                        outer: before..after,
                        inner: None,
                    };
                    return Ok(Some((span, children)));
                },
                Some(pd) if depth == pd => children.push(ElementSpan {
                    name: e.local_name().as_ref().to_vec(),
                    outer: before..after,
                    inner: None,
                }),
                _ => {},
            },
            Event::End(_) => {
                match parent_depth {
                    Some(pd) if depth == pd => {
                        let span = ElementSpan {
                            name: parent.to_vec(),
                            outer: parent_start..after,
                            inner: Some(parent_inner..before),
                        };
                        return Ok(Some((span, children)));
                    },
                    Some(pd) if depth == pd + 1 => {
                        if let Some((name, start, inner_start)) = open_child.take() {
                            children.push(ElementSpan {
                                name,
                                outer: start..after,
                                inner: Some(inner_start..before),
                            });
                        }
                    },
                    _ => {},
                }
                depth = depth.saturating_sub(1);
            },
            Event::Eof => return Ok(None),
            _ => {},
        }
    }
}

/// Apply byte-range edits to `xml`.
///
/// Edits are applied in order of their start offset; an edit overlapping
/// an earlier one is ignored. An empty range inserts.
pub fn splice(xml: &[u8], mut edits: Vec<(Range<usize>, String)>) -> Vec<u8> {
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = Vec::with_capacity(xml.len() + edits.iter().map(|(_, s)| s.len()).sum::<usize>());
    let mut cursor = 0;
    for (range, replacement) in edits {
        if range.start < cursor {
            continue;
        }
        out.extend_from_slice(&xml[cursor..range.start]);
        out.extend_from_slice(replacement.as_bytes());
        cursor = range.end;
    }
    out.extend_from_slice(&xml[cursor..]);
    out
}

/// Qualified-name prefix (with the colon) of the first element named
/// `local`, e.g. `"p:"`. Empty when the element is unprefixed or absent.
pub fn element_prefix(xml: &[u8], local: &[u8]) -> String {
    let mut reader = Reader::from_reader(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == local => {
                return e
                    .name()
                    .prefix()
                    .map(|p| format!("{}:", String::from_utf8_lossy(p.as_ref())))
                    .unwrap_or_default();
            },
            Ok(Event::Eof) | Err(_) => return String::new(),
            _ => {},
        }
    }
}

/// Read an attribute by its local name, unescaped.
///
/// Namespace prefixes are ignored, so `r:embed` and `embed` both match
/// `b"embed"`. Malformed attributes are skipped.
pub fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == local {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Read an attribute by local name and parse it as an integer.
pub fn attr_i64(e: &BytesStart<'_>, local: &[u8]) -> Option<i64> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == local {
            return atoi_simd::parse::<i64>(attr.value.as_ref()).ok();
        }
    }
    None
}

/// Append the character data carried by a text-like event to `out`.
///
/// quick-xml reports entity references (`&amp;`, `&#10;`) as separate
/// `GeneralRef` events, so text has to be stitched back together from
/// `Text`, `GeneralRef` and `CData` events. Returns `false` for any other
/// event.
pub fn append_text(out: &mut String, event: &Event<'_>) -> bool {
    match event {
        Event::Text(e) => {
            if let Ok(text) = std::str::from_utf8(e.as_ref()) {
                out.push_str(&unescape_xml(text));
            }
            true
        },
        Event::GeneralRef(e) => {
            if let Ok(name) = std::str::from_utf8(e.as_ref()) {
                match resolve_entity(name) {
                    Some(c) => out.push(c),
                    None => {
                        out.push('&');
                        out.push_str(name);
                        out.push(';');
                    },
                }
            }
            true
        },
        Event::CData(e) => {
            if let Ok(text) = std::str::from_utf8(e.as_ref()) {
                out.push_str(text);
            }
            true
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;
    use quick_xml::events::Event;

    #[test]
    fn test_attr_helpers_ignore_prefix() {
        let xml = br#"<a:blip r:embed="rId7" sz="1400" name="A &amp; B"/>"#;
        let mut reader = Reader::from_reader(&xml[..]);
        match reader.read_event() {
            Ok(Event::Empty(e)) => {
                assert_eq!(attr_value(&e, b"embed").as_deref(), Some("rId7"));
                assert_eq!(attr_i64(&e, b"sz"), Some(1400));
                assert_eq!(attr_value(&e, b"name").as_deref(), Some("A & B"));
                assert_eq!(attr_value(&e, b"missing"), None);
            },
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_append_text_stitches_entities() {
        let xml = b"<t>Fish &amp; Chips&#10;<![CDATA[<raw>]]></t>";
        let mut reader = Reader::from_reader(&xml[..]);
        let mut text = String::new();
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(ev) => {
                    append_text(&mut text, &ev);
                },
                Err(e) => panic!("{e}"),
            }
        }
        assert_eq!(text, "Fish & Chips\n<raw>");
    }

    #[test]
    fn test_find_children_spans() {
        let xml = br#"<?xml version="1.0"?><root><p:tree a="1"><x/> <y><z/></y></p:tree></root>"#;
        let (parent, children) = find_children(xml, b"tree").unwrap().unwrap();
        assert_eq!(&xml[parent.outer.clone()], br#"<p:tree a="1"><x/> <y><z/></y></p:tree>"#);
        assert_eq!(&xml[parent.inner.clone().unwrap()], b"<x/> <y><z/></y>");
        assert_eq!(children.len(), 2);
        assert!(children[0].is(b"x"));
        assert_eq!(&xml[children[0].outer.clone()], b"<x/>");
        assert!(children[0].inner.is_none());
        assert_eq!(&xml[children[1].outer.clone()], b"<y><z/></y>");
        assert_eq!(&xml[children[1].inner.clone().unwrap()], b"<z/>");

        assert!(find_children(xml, b"missing").unwrap().is_none());
        let (empty, kids) = find_children(b"<a><b/></a>", b"b").unwrap().unwrap();
        assert_eq!(empty.outer, 3..7);
        assert!(kids.is_empty());
        assert_eq!(element_prefix(xml, b"tree"), "p:");
        assert_eq!(element_prefix(xml, b"root"), "");
    }

    #[test]
    fn test_splice() {
        let xml = b"<a><b/><c/></a>";
        let out = splice(xml, vec![(7..11, "<d/>".to_string()), (3..7, String::new()), (14..14, "<e/>".to_string())]);
        assert_eq!(out, b"<a><d/></a<e/>>".to_vec());
        let out = splice(xml, vec![(3..11, "x".to_string()), (7..11, "y".to_string())]);
        assert_eq!(out, b"<a>x</a>".to_vec());
    }

    #[test]
    fn test_escape_round_trip() {
        let raw = "Tom & Jerry <\"quoted\"> 'single'";
        assert_eq!(unescape_xml(&escape_xml(raw)), raw);
    }
}
