/// Package implementation for PowerPoint presentations.
use crate::common::xml::{attr_i64, attr_value};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as RT};
use crate::ooxml::opc::{OpcPackage, PackURI, Relationships};
use crate::ooxml::pptx::slide::Slide;
use crate::ooxml::pptx::template::blank_package;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Default slide size (10 x 7.5 in) when `p:sldSz` is absent.
const DEFAULT_SLIDE_SIZE: (i64, i64) = (9_144_000, 6_858_000);

/// A PowerPoint (.pptx/.potx) package.
///
/// Wraps an OPC package whose main part is a presentation and gives access
/// to the slide list, slide size and layouts.
///
/// # Examples
///
/// ```rust,no_run
/// use rowdeck::ooxml::pptx::Package;
///
/// let pkg = Package::open("template.pptx")?;
/// let (cx, cy) = pkg.slide_size()?;
/// println!("{} slides, {}x{} EMU", pkg.slide_partnames()?.len(), cx, cy);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,
    /// Partname of `presentation.xml`
    presentation: PackURI,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Load a .pptx package from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    /// Wrap an OPC package, verifying its main part is a presentation.
    pub fn from_opc(opc: OpcPackage) -> Result<Self> {
        let presentation = opc
            .main_document_partname()
            .map_err(|e| OoxmlError::PartNotFound(format!("main presentation part: {}", e)))?;

        let content_type = opc.content_types().get(&presentation).unwrap_or_default();
        if content_type != ct::PML_PRESENTATION_MAIN && content_type != ct::PML_TEMPLATE_MAIN {
            return Err(OoxmlError::InvalidContentType {
                expected: format!("{} or {}", ct::PML_PRESENTATION_MAIN, ct::PML_TEMPLATE_MAIN),
                got: content_type.to_string(),
            });
        }

        Ok(Self { opc, presentation })
    }

    /// The built-in blank presentation with the given slide size in EMUs.
    pub fn blank(slide_width: i64, slide_height: i64) -> Result<Self> {
        Self::from_opc(blank_package(slide_width, slide_height))
    }

    #[inline]
    pub fn presentation_partname(&self) -> &PackURI {
        &self.presentation
    }

    /// Raw `presentation.xml`.
    pub fn presentation_xml(&self) -> Result<&[u8]> {
        Ok(self.opc.require_part(&self.presentation)?)
    }

    pub fn presentation_rels(&self) -> Result<Relationships> {
        Ok(self.opc.rels_for(&self.presentation)?)
    }

    /// Slide size in EMUs from `p:sldSz`.
    pub fn slide_size(&self) -> Result<(i64, i64)> {
        let xml = self.presentation_xml()?;
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldSz" => {
                    let cx = attr_i64(&e, b"cx").unwrap_or(DEFAULT_SLIDE_SIZE.0);
                    let cy = attr_i64(&e, b"cy").unwrap_or(DEFAULT_SLIDE_SIZE.1);
                    return Ok((cx, cy));
                },
                Event::Eof => return Ok(DEFAULT_SLIDE_SIZE),
                _ => {},
            }
            buf.clear();
        }
    }

    /// Slide partnames in presentation order (`p:sldIdLst`).
    ///
    /// Entries whose relationship is missing or points at a missing part are
    /// skipped.
    pub fn slide_partnames(&self) -> Result<Vec<PackURI>> {
        let rels = self.presentation_rels()?;
        let xml = self.presentation_xml()?;
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut slides = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                    if let Some(r_id) = relationship_id(&e)
                        && let Some(rel) = rels.get(&r_id)
                        && rel.reltype() == RT::SLIDE
                        && let Ok(partname) = rel.target_partname()
                        && self.opc.contains(&partname)
                    {
                        slides.push(partname);
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        Ok(slides)
    }

    /// The first slide, or `None` for a presentation without slides.
    pub fn first_slide(&self) -> Result<Option<Slide>> {
        match self.slide_partnames()?.first() {
            Some(partname) => Ok(Some(Slide::load(&self.opc, partname)?)),
            None => Ok(None),
        }
    }

    /// The layout new blank slides are bound to.
    ///
    /// Prefers a layout of type `blank` or whose name contains "blank"
    /// (case-insensitive); otherwise the last layout.
    pub fn blank_layout(&self) -> Result<PackURI> {
        let mut layouts: Vec<PackURI> = self
            .opc
            .content_types()
            .partnames_of_type(ct::PML_SLIDE_LAYOUT)
            .into_iter()
            .filter_map(|pn| PackURI::new(pn).ok())
            .filter(|pn| self.opc.contains(pn))
            .collect();
        layouts.sort_by_key(|pn| (pn.idx().unwrap_or(0), pn.as_str().to_string()));

        for layout in &layouts {
            if let Some(xml) = self.opc.part(layout)
                && is_blank_layout(xml)?
            {
                return Ok(layout.clone());
            }
        }

        layouts
            .pop()
            .ok_or_else(|| OoxmlError::PartNotFound("slide layout".to_string()))
    }

    /// Get the underlying OPC package.
    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_package_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }
}

/// The `r:id` attribute of an element that also carries a plain `id`.
fn relationship_id(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn is_blank_layout(xml: &[u8]) -> Result<bool> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sldLayout" => {
                    if attr_value(&e, b"type").as_deref() == Some("blank") {
                        return Ok(true);
                    }
                },
                b"cSld" => {
                    let name = attr_value(&e, b"name").unwrap_or_default();
                    return Ok(name.to_lowercase().contains("blank"));
                },
                _ => {},
            },
            Event::Eof => return Ok(false),
            _ => {},
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::template::BLANK_LAYOUT_PART;

    #[test]
    fn test_blank_package() {
        let pkg = Package::blank(9_144_000, 6_858_000).unwrap();
        assert_eq!(pkg.slide_size().unwrap(), (9_144_000, 6_858_000));
        assert!(pkg.slide_partnames().unwrap().is_empty());
        assert!(pkg.first_slide().unwrap().is_none());
        assert_eq!(pkg.blank_layout().unwrap().as_str(), BLANK_LAYOUT_PART);
    }

    #[test]
    fn test_rejects_non_presentation() {
        let mut opc = OpcPackage::new();
        let mut rels = Relationships::new("/");
        rels.add(RT::OFFICE_DOCUMENT, "xl/workbook.xml");
        opc.set_rels(&PackURI::from_membername("/"), &rels);
        opc.set_part(&PackURI::from_membername("xl/workbook.xml"), b"<workbook/>".to_vec(), Some("application/xml"));
        assert!(matches!(Package::from_opc(opc), Err(OoxmlError::InvalidContentType { .. })));
    }

    #[test]
    fn test_relationship_id_prefers_prefixed_attribute() {
        let mut reader = Reader::from_reader(&br#"<p:sldId id="256" r:id="rId7"/>"#[..]);
        match reader.read_event().unwrap() {
            Event::Empty(e) => assert_eq!(relationship_id(&e).as_deref(), Some("rId7")),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_blank_layout_detection() {
        assert!(is_blank_layout(br#"<p:sldLayout type="blank"><p:cSld name="Foo"/></p:sldLayout>"#).unwrap());
        assert!(is_blank_layout(br#"<p:sldLayout><p:cSld name="My Blank"/></p:sldLayout>"#).unwrap());
        assert!(!is_blank_layout(br#"<p:sldLayout type="title"><p:cSld name="Title Slide"/></p:sldLayout>"#).unwrap());
    }
}
