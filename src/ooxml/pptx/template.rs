//! Built-in blank presentation.
//!
//! Used when no template is supplied: one slide master, one blank layout and
//! an Office-style theme, which is the least PowerPoint accepts without
//! offering to repair the file. The slide size is filled in per run.

use crate::ooxml::opc::constants::{content_type as CT, relationship_type as RT};
use crate::ooxml::opc::{OpcPackage, PackURI, Relationships};

pub const PRESENTATION_PART: &str = "/ppt/presentation.xml";
pub const SLIDE_MASTER_PART: &str = "/ppt/slideMasters/slideMaster1.xml";
pub const BLANK_LAYOUT_PART: &str = "/ppt/slideLayouts/slideLayout1.xml";
pub const THEME_PART: &str = "/ppt/theme/theme1.xml";

const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const GROUP_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

/// `presentation.xml` with an empty slide list.
pub fn presentation_xml(slide_width: i64, slide_height: i64) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS_DECLS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldSz cx="{slide_width}" cy="{slide_height}"/><p:notesSz cx="6858000" cy="9144000"/><p:defaultTextStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr><a:lvl1pPr marL="0" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:defaultTextStyle></p:presentation>"#
    )
}

/// The single slide master.
pub fn slide_master_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {NS_DECLS}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr algn="l"><a:defRPr sz="4400" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr marL="0" algn="l"><a:defRPr sz="2800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr marL="0" algn="l"><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#
    )
}

/// The blank slide layout.
pub fn blank_layout_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {NS_DECLS} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

/// A blank slide bound to a layout through `rId1`.
pub fn blank_slide_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS_DECLS}><p:cSld><p:spTree>{GROUP_PROPS}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

fn scheme_color(tag: &str, rgb: &str) -> String {
    format!(r#"<a:{tag}><a:srgbClr val="{rgb}"/></a:{tag}>"#)
}

/// Office-style theme with the standard colour, font and format schemes.
pub fn theme_xml() -> String {
    let mut colors = String::from(
        r#"<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
    );
    for (tag, rgb) in [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ] {
        colors.push_str(&scheme_color(tag, rgb));
    }
    colors.push_str("</a:clrScheme>");

    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let line = format!(r#"<a:ln w="6350" cap="flat" cmpd="sng" algn="ctr">{solid}<a:prstDash val="solid"/><a:miter lim="800000"/></a:ln>"#);
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements>{colors}<a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst><a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst><a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#
    )
}

/// Assemble the blank presentation package (no slides).
pub fn blank_package(slide_width: i64, slide_height: i64) -> OpcPackage {
    let mut pkg = OpcPackage::new();

    let mut root_rels = Relationships::new("/");
    root_rels.add(RT::OFFICE_DOCUMENT, "ppt/presentation.xml");
    pkg.set_rels(&PackURI::from_membername("/"), &root_rels);

    let presentation = PackURI::from_membername(PRESENTATION_PART);
    pkg.set_part(
        &presentation,
        presentation_xml(slide_width, slide_height).into_bytes(),
        Some(CT::PML_PRESENTATION_MAIN),
    );
    let mut pres_rels = Relationships::new(presentation.base_uri());
    pres_rels.add(RT::SLIDE_MASTER, "slideMasters/slideMaster1.xml");
    pres_rels.add(RT::THEME, "theme/theme1.xml");
    pkg.set_rels(&presentation, &pres_rels);

    let master = PackURI::from_membername(SLIDE_MASTER_PART);
    pkg.set_part(&master, slide_master_xml().into_bytes(), Some(CT::PML_SLIDE_MASTER));
    let mut master_rels = Relationships::new(master.base_uri());
    master_rels.add(RT::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
    master_rels.add(RT::THEME, "../theme/theme1.xml");
    pkg.set_rels(&master, &master_rels);

    let layout = PackURI::from_membername(BLANK_LAYOUT_PART);
    pkg.set_part(&layout, blank_layout_xml().into_bytes(), Some(CT::PML_SLIDE_LAYOUT));
    let mut layout_rels = Relationships::new(layout.base_uri());
    layout_rels.add(RT::SLIDE_MASTER, "../slideMasters/slideMaster1.xml");
    pkg.set_rels(&layout, &layout_rels);

    pkg.set_part(
        &PackURI::from_membername(THEME_PART),
        theme_xml().into_bytes(),
        Some(CT::OFC_THEME),
    );

    pkg
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::Reader;
    use quick_xml::events::Event;

    fn assert_well_formed(xml: &str) {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut depth = 0i32;
        loop {
            match reader.read_event() {
                Ok(Event::Start(_)) => depth += 1,
                Ok(Event::End(_)) => depth -= 1,
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => panic!("malformed XML: {e}"),
            }
        }
        assert_eq!(depth, 0);
    }

    #[test]
    fn test_parts_are_well_formed() {
        assert_well_formed(&presentation_xml(9_144_000, 6_858_000));
        assert_well_formed(&slide_master_xml());
        assert_well_formed(&blank_layout_xml());
        assert_well_formed(&blank_slide_xml());
        assert_well_formed(&theme_xml());
    }

    #[test]
    fn test_blank_package_links_up() {
        let pkg = blank_package(6_858_000, 9_144_000);
        let main = pkg.main_document_partname().unwrap();
        assert_eq!(main.as_str(), PRESENTATION_PART);
        let rels = pkg.rels_for(&main).unwrap();
        let master = rels.first_of_type(RT::SLIDE_MASTER).unwrap().target_partname().unwrap();
        assert!(pkg.contains(&master));
        let layout = pkg
            .rels_for(&master)
            .unwrap()
            .first_of_type(RT::SLIDE_LAYOUT)
            .unwrap()
            .target_partname()
            .unwrap();
        assert_eq!(layout.as_str(), BLANK_LAYOUT_PART);
        let xml = String::from_utf8(pkg.part(&main).unwrap().to_vec()).unwrap();
        assert!(xml.contains(r#"<p:sldSz cx="6858000" cy="9144000"/>"#));
    }
}
