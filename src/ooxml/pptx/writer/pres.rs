/// Presentation writer for PPTX.
use crate::common::xml::{element_prefix, find_children, splice};
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as RT};
use crate::ooxml::opc::{PackURI, Relationships};
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::writer::slide::{BuiltSlide, SLIDES_BASE_URI};
use std::collections::HashSet;
use std::fmt::Write as FmtWrite;
use std::ops::Range;
use tracing::debug;

/// First id handed out in `p:sldIdLst`.
const FIRST_SLIDE_ID: u32 = 256;

/// A presentation being assembled from generated slides.
///
/// Created from a package whose existing slides are all removed; layouts,
/// masters, themes and media stay, so cloned slides keep resolving their
/// relationships.
#[derive(Debug)]
pub struct MutablePresentation {
    package: Package,
    pres_rels: Relationships,
    /// Presentation-level rIds of the added slides, in order
    slide_rel_ids: Vec<String>,
    next_slide_idx: u32,
    next_media_idx: u32,
}

impl MutablePresentation {
    /// Take over a package, dropping its slides and their notes pages.
    pub fn new(mut package: Package) -> Result<Self> {
        let presentation = package.presentation_partname().clone();
        let mut pres_rels = package.presentation_rels()?;

        let mut doomed: HashSet<PackURI> = package.slide_partnames()?.into_iter().collect();
        doomed.extend(
            package
                .opc_package()
                .content_types()
                .partnames_of_type(ct::PML_SLIDE)
                .into_iter()
                .filter_map(|pn| PackURI::new(pn).ok()),
        );

        let opc = package.opc_package_mut();
        for slide in &doomed {
            let rels = opc.rels_for(slide)?;
            for rel in rels.iter() {
                if rel.reltype() == RT::NOTES_SLIDE
                    && !rel.is_external()
                    && let Ok(notes) = rel.target_partname()
                {
                    opc.remove_part(&notes);
                }
            }
            opc.remove_part(slide);
        }
        pres_rels.retain(|rel| rel.reltype() != RT::SLIDE);
        opc.set_rels(&presentation, &pres_rels);
        debug!(removed = doomed.len(), "cleared template slides");

        Ok(Self {
            package,
            pres_rels,
            slide_rel_ids: Vec::new(),
            next_slide_idx: 1,
            next_media_idx: 1,
        })
    }

    /// Slide size in EMUs.
    pub fn slide_size(&self) -> Result<(i64, i64)> {
        self.package.slide_size()
    }

    /// Relationship target from a slide to the package's blank layout.
    pub fn blank_layout_target(&self) -> Result<String> {
        Ok(self.package.blank_layout()?.relative_ref(SLIDES_BASE_URI))
    }

    /// Get the number of slides added so far.
    #[inline]
    pub fn slide_count(&self) -> usize {
        self.slide_rel_ids.len()
    }

    /// Add a finished slide after the previously added ones.
    pub fn add_slide(&mut self, slide: BuiltSlide) -> Result<PackURI> {
        let partname = self.next_free_partname();
        let BuiltSlide { xml, mut rels, media } = slide;

        for item in media {
            let media_partname = self.next_free_media_partname(item.format.extension());
            let opc = self.package.opc_package_mut();
            opc.content_types_mut()
                .ensure_default(item.format.extension(), item.format.mime_type());
            opc.set_part(&media_partname, item.data, None);
            rels.add_relationship(
                RT::IMAGE,
                &media_partname.relative_ref(partname.base_uri()),
                item.rel_id,
                false,
            );
        }

        let opc = self.package.opc_package_mut();
        opc.set_part(&partname, xml, Some(ct::PML_SLIDE));
        opc.set_rels(&partname, &rels);

        let presentation = self.package.presentation_partname().clone();
        let r_id = self
            .pres_rels
            .add(RT::SLIDE, &partname.relative_ref(presentation.base_uri()));
        self.slide_rel_ids.push(r_id);
        Ok(partname)
    }

    fn next_free_partname(&mut self) -> PackURI {
        loop {
            let candidate = PackURI::from_membername(&format!("ppt/slides/slide{}.xml", self.next_slide_idx));
            self.next_slide_idx += 1;
            if !self.package.opc_package().contains(&candidate) {
                return candidate;
            }
        }
    }

    fn next_free_media_partname(&mut self, ext: &str) -> PackURI {
        loop {
            let candidate =
                PackURI::from_membername(&format!("ppt/media/generated{}.{}", self.next_media_idx, ext));
            self.next_media_idx += 1;
            if !self.package.opc_package().contains(&candidate) {
                return candidate;
            }
        }
    }

    /// Write the slide list into `presentation.xml` and serialize the
    /// package.
    pub fn save_to_bytes(mut self) -> Result<Vec<u8>> {
        let presentation = self.package.presentation_partname().clone();
        let xml = rewrite_presentation_xml(self.package.presentation_xml()?, &self.slide_rel_ids)?;

        let opc = self.package.opc_package_mut();
        // A .potx template is written out as a regular presentation.
        opc.set_part(&presentation, xml, Some(ct::PML_PRESENTATION_MAIN));
        opc.set_rels(&presentation, &self.pres_rels);

        Ok(opc.to_bytes()?)
    }
}

/// Replace `p:sldIdLst` with one entry per slide rId and drop the lists that
/// refer to removed slides (custom shows, sections).
fn rewrite_presentation_xml(xml: &[u8], slide_rel_ids: &[String]) -> Result<Vec<u8>> {
    let (_, children) = find_children(xml, b"presentation")?
        .ok_or_else(|| OoxmlError::InvalidFormat("missing p:presentation".to_string()))?;
    let prefix = element_prefix(xml, b"presentation");

    let mut list = String::new();
    if !slide_rel_ids.is_empty() {
        write!(list, "<{}sldIdLst>", prefix).map_err(|e| OoxmlError::Xml(e.to_string()))?;
        for (i, r_id) in slide_rel_ids.iter().enumerate() {
            write!(
                list,
                r#"<{}sldId id="{}" r:id="{}"/>"#,
                prefix,
                FIRST_SLIDE_ID + i as u32,
                r_id
            )
            .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        write!(list, "</{}sldIdLst>", prefix).map_err(|e| OoxmlError::Xml(e.to_string()))?;
    }

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    let mut list_placed = false;
    let mut insert_after = None;

    for child in &children {
        if child.is(b"sldIdLst") {
            edits.push((child.outer.clone(), std::mem::take(&mut list)));
            list_placed = true;
        } else if child.is(b"custShowLst") {
            edits.push((child.outer.clone(), String::new()));
        } else if child.is(b"sldMasterIdLst") || child.is(b"notesMasterIdLst") || child.is(b"handoutMasterIdLst") {
            insert_after = Some(child.outer.end);
        } else if child.is(b"extLst") {
            let ext_lst = &xml[child.outer.clone()];
            if let Some((_, exts)) = find_children(ext_lst, b"extLst")? {
                for ext in exts {
                    if find_children(&ext_lst[ext.outer.clone()], b"sectionLst")?.is_some() {
                        let start = child.outer.start + ext.outer.start;
                        let end = child.outer.start + ext.outer.end;
                        edits.push((start..end, String::new()));
                    }
                }
            }
        }
    }

    if !list_placed && !list.is_empty() {
        let at = insert_after
            .ok_or_else(|| OoxmlError::InvalidFormat("missing p:sldMasterIdLst".to_string()))?;
        edits.push((at..at, list));
    }

    Ok(splice(xml, edits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::OpcPackage;
    use crate::ooxml::pptx::format::{Autofit, ImageFormat};
    use crate::ooxml::pptx::shapes::ShapeGeometry;
    use crate::ooxml::pptx::writer::shape::ParagraphSpec;
    use crate::ooxml::pptx::writer::slide::MutableSlide;

    #[test]
    fn test_rewrite_presentation_xml() {
        let xml = br#"<p:presentation xmlns:p="p" xmlns:r="r"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst><p:sldSz cx="1" cy="2"/><p:custShowLst><p:custShow name="x" id="0"/></p:custShowLst><p:extLst><p:ext uri="{521415D9}"><p14:sectionLst xmlns:p14="p14"/></p:ext><p:ext uri="{other}"><x/></p:ext></p:extLst></p:presentation>"#;
        let out = rewrite_presentation_xml(xml, &["rId9".to_string(), "rId10".to_string()]).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"<p:sldIdLst><p:sldId id="256" r:id="rId9"/><p:sldId id="257" r:id="rId10"/></p:sldIdLst><p:sldSz"#));
        assert!(!out.contains("custShowLst"));
        assert!(!out.contains("sectionLst"));
        assert!(out.contains(r#"<p:extLst><p:ext uri="{other}"><x/></p:ext></p:extLst>"#));
    }

    #[test]
    fn test_insert_slide_list_after_masters() {
        let xml = br#"<p:presentation xmlns:p="p"><p:sldMasterIdLst/><p:notesMasterIdLst/><p:sldSz cx="1" cy="2"/></p:presentation>"#;
        let out = rewrite_presentation_xml(xml, &["rId4".to_string()]).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains(r#"<p:notesMasterIdLst/><p:sldIdLst><p:sldId id="256" r:id="rId4"/></p:sldIdLst><p:sldSz"#));
    }

    #[test]
    fn test_blank_presentation_round_trip() {
        let mut pres = MutablePresentation::new(Package::blank(9_144_000, 6_858_000).unwrap()).unwrap();
        let layout = pres.blank_layout_target().unwrap();
        assert_eq!(layout, "../slideLayouts/slideLayout1.xml");

        for i in 0..3 {
            let mut slide = MutableSlide::blank(&layout).unwrap();
            slide
                .add_text_box(
                    ShapeGeometry::new(0, 0, 100, 100),
                    vec![ParagraphSpec::new(format!("row {i}"))],
                    Autofit::default(),
                )
                .unwrap();
            slide
                .add_picture(ShapeGeometry::new(0, 0, 10, 10), vec![0x89, b'P', b'N', b'G'], ImageFormat::Png, "")
                .unwrap();
            pres.add_slide(slide.finish()).unwrap();
        }
        assert_eq!(pres.slide_count(), 3);

        let bytes = pres.save_to_bytes().unwrap();
        let reopened = Package::from_opc(OpcPackage::from_bytes(bytes).unwrap()).unwrap();
        let slides = reopened.slide_partnames().unwrap();
        assert_eq!(
            slides.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            vec!["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml", "/ppt/slides/slide3.xml"]
        );

        let opc = reopened.opc_package();
        let rels = opc.rels_for(&slides[2]).unwrap();
        let image = rels.first_of_type(RT::IMAGE).unwrap().target_partname().unwrap();
        assert_eq!(image.as_str(), "/ppt/media/generated3.png");
        assert!(opc.contains(&image));
        assert_eq!(opc.content_types().get(&image), Some("image/png"));
        assert_eq!(opc.content_types().get(&slides[0]), Some(ct::PML_SLIDE));
    }
}
