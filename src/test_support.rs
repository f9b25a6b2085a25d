//! Fixture builders shared by unit tests.

use crate::ooxml::opc::constants::{content_type as CT, relationship_type as RT};
use crate::ooxml::opc::{OpcPackage, PackURI, Relationships};
use crate::ooxml::pptx::writer::SLIDES_BASE_URI;
use crate::ooxml::pptx::{BuiltSlide, ImageFormat, MutablePresentation, Package, Slide, SlideMedia};
use crate::ooxml::xlsx::cell::{CellRef, column_to_letters};
use std::fmt::Write as _;

/// Template slide: an image placeholder, a text box whose first and last
/// paragraphs are spacers, a logo picture, and a second shape reusing the
/// placeholder's name.
pub const TEMPLATE_SLIDE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Rectangle 1"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="457200"/><a:ext cx="5029200" cy="3657600"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="TextBox 2"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr><a:xfrm><a:off x="457200" y="4572000"/><a:ext cx="5943600" cy="1828800"/></a:xfrm></p:spPr><p:txBody><a:bodyPr wrap="square"/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p><a:p><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="2000" b="1"><a:latin typeface="Georgia"/></a:rPr><a:t>Brand</a:t></a:r></a:p><a:p><a:r><a:rPr lang="en-US" sz="1200"/><a:t>Description</a:t></a:r></a:p><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody></p:sp><p:pic><p:nvPicPr><p:cNvPr id="4" name="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="100" cy="100"/></a:xfrm></p:spPr></p:pic><p:sp><p:nvSpPr><p:cNvPr id="5" name="Rectangle 1"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sld>"#;

/// [`TEMPLATE_SLIDE`] as a loaded slide.
pub fn template_slide() -> Slide {
    let mut rels = Relationships::new(SLIDES_BASE_URI);
    rels.add(RT::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
    rels.add(RT::IMAGE, "../media/image1.png");
    Slide::from_parts(
        PackURI::from_membername("ppt/slides/slide1.xml"),
        TEMPLATE_SLIDE.as_bytes().to_vec(),
        rels,
    )
    .unwrap()
}

/// A landscape `.pptx` whose only slide is `slide_xml`, with a logo image
/// available as `rId2`.
pub fn template_pptx(slide_xml: &str) -> Vec<u8> {
    let mut pres = MutablePresentation::new(Package::blank(9_144_000, 6_858_000).unwrap()).unwrap();
    let mut rels = Relationships::new(SLIDES_BASE_URI);
    rels.add(RT::SLIDE_LAYOUT, &pres.blank_layout_target().unwrap());
    pres.add_slide(BuiltSlide {
        xml: slide_xml.as_bytes().to_vec(),
        rels,
        media: vec![SlideMedia {
            rel_id: "rId2".to_string(),
            data: tiny_png(2, 2),
            format: ImageFormat::Png,
        }],
    })
    .unwrap();
    pres.save_to_bytes().unwrap()
}

pub const METADATA: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<metadata xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:xlrd="http://schemas.microsoft.com/office/spreadsheetml/2017/richdata">
  <metadataTypes count="1"><metadataType name="XLRICHVALUE" minSupportedVersion="120000"/></metadataTypes>
  <futureMetadata name="XLRICHVALUE" count="2">
    <bk><extLst><ext uri="{3e2802c4-a4d2-4d8b-9148-e3be6c30e623}"><xlrd:rvb i="1"/></ext></extLst></bk>
    <bk><extLst><ext uri="{3e2802c4-a4d2-4d8b-9148-e3be6c30e623}"><xlrd:rvb i="0"/></ext></extLst></bk>
  </futureMetadata>
  <valueMetadata count="2"><bk><rc t="1" v="0"/></bk><bk><rc t="1" v="1"/></bk></valueMetadata>
</metadata>"#;

pub const RICH_VALUES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rvData xmlns="http://schemas.microsoft.com/office/spreadsheetml/2017/richdata" count="2">
  <rv s="0"><v>5</v><v>0</v></rv>
  <rv s="0"><v>5</v><v>1</v></rv>
</rvData>"#;

pub const STRUCTURES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rvStructures xmlns="http://schemas.microsoft.com/office/spreadsheetml/2017/richdata" count="1">
  <s t="_localImage"><k n="CalcOrigin" t="i"/><k n="_rvRel:LocalImageIdentifier" t="i"/></s>
</rvStructures>"#;

pub const REL_LIST: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<richValueRels xmlns="http://schemas.microsoft.com/office/spreadsheetml/2022/richvaluerel" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <rel r:id="rId2"/><rel r:id="rId1"/>
</richValueRels>"#;

/// Encode a solid-colour PNG of the given size.
pub fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Builder for a single-sheet `.xlsx` package.
///
/// Row 1 holds the headers; each `row` call appends a data row. Text values
/// go through the shared strings table, numeric-looking ones are stored as
/// numbers, empty strings produce no cell.
pub struct WorkbookFixture {
    rows: Vec<Vec<String>>,
    drawing_images: Vec<(CellRef, Vec<u8>)>,
    rich_images: Vec<(CellRef, Vec<u8>)>,
}

impl WorkbookFixture {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            rows: vec![headers.iter().map(|s| s.to_string()).collect()],
            drawing_images: Vec::new(),
            rich_images: Vec::new(),
        }
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Anchor a picture at (zero-based column, one-based row).
    pub fn drawing_image(mut self, column: u32, row: u32, png: Vec<u8>) -> Self {
        self.drawing_images.push((CellRef::new(column, row), png));
        self
    }

    /// Paste a picture into the cell (zero-based column, one-based row).
    pub fn rich_image(mut self, column: u32, row: u32, png: Vec<u8>) -> Self {
        self.rich_images.push((CellRef::new(column, row), png));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.package().to_bytes().unwrap()
    }

    pub fn package(&self) -> OpcPackage {
        let mut pkg = OpcPackage::new();
        pkg.content_types_mut().add_default("png", CT::PNG);

        let mut root_rels = Relationships::new("/");
        root_rels.add(RT::OFFICE_DOCUMENT, "xl/workbook.xml");
        pkg.set_rels(&PackURI::from_membername("/"), &root_rels);

        pkg.set_part(
            &PackURI::from_membername("xl/workbook.xml"),
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="0"/></bookViews><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                .to_vec(),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"),
        );
        let mut wb_rels = Relationships::new("/xl");
        wb_rels.add(RT::WORKSHEET, "worksheets/sheet1.xml");
        wb_rels.add(RT::SHARED_STRINGS, "sharedStrings.xml");
        pkg.set_rels(&PackURI::from_membername("xl/workbook.xml"), &wb_rels);

        let mut strings: Vec<&str> = Vec::new();
        let mut sheet = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheetData>"#,
        );
        let last_row = self
            .rows
            .len()
            .max(self.rich_images.iter().map(|(c, _)| c.row as usize).max().unwrap_or(0));
        for row_idx in 0..last_row {
            let row = row_idx as u32 + 1;
            write!(sheet, r#"<row r="{}">"#, row).unwrap();
            let values: &[String] = self.rows.get(row_idx).map(Vec::as_slice).unwrap_or(&[]);
            let width = values.len().max(
                self.rich_images
                    .iter()
                    .filter(|(c, _)| c.row == row)
                    .map(|(c, _)| c.column as usize + 1)
                    .max()
                    .unwrap_or(0),
            );
            for col in 0..width {
                let reference = format!("{}{}", column_to_letters(col as u32), row);
                if let Some(k) = self
                    .rich_images
                    .iter()
                    .position(|(c, _)| *c == CellRef::new(col as u32, row))
                {
                    // A row value in a rich cell stands in for text left next to the picture
                    match values.get(col).filter(|v| !v.is_empty()) {
                        Some(text) => write!(
                            sheet,
                            r#"<c r="{}" t="str" vm="{}"><v>{}</v></c>"#,
                            reference,
                            k + 1,
                            crate::common::xml::escape_xml(text)
                        )
                        .unwrap(),
                        None => write!(sheet, r#"<c r="{}" t="e" vm="{}"><v>#VALUE!</v></c>"#, reference, k + 1).unwrap(),
                    }
                    continue;
                }
                let value = values.get(col).map(String::as_str).unwrap_or("");
                if value.is_empty() {
                    continue;
                }
                if value.parse::<f64>().is_ok() {
                    write!(sheet, r#"<c r="{}"><v>{}</v></c>"#, reference, value).unwrap();
                } else {
                    let idx = strings.iter().position(|s| *s == value).unwrap_or_else(|| {
                        strings.push(value);
                        strings.len() - 1
                    });
                    write!(sheet, r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, idx).unwrap();
                }
            }
            sheet.push_str("</row>");
        }
        sheet.push_str("</sheetData>");
        if !self.drawing_images.is_empty() {
            sheet.push_str(r#"<drawing r:id="rId1"/>"#);
        }
        sheet.push_str("</worksheet>");

        let sheet_part = PackURI::from_membername("xl/worksheets/sheet1.xml");
        pkg.set_part(
            &sheet_part,
            sheet.into_bytes(),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"),
        );

        let mut sst = String::from(r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
        for s in &strings {
            write!(sst, "<si><t>{}</t></si>", crate::common::xml::escape_xml(s)).unwrap();
        }
        sst.push_str("</sst>");
        pkg.set_part(&PackURI::from_membername("xl/sharedStrings.xml"), sst.into_bytes(), None);

        if !self.drawing_images.is_empty() {
            let mut sheet_rels = Relationships::new("/xl/worksheets");
            sheet_rels.add(RT::DRAWING, "../drawings/drawing1.xml");
            pkg.set_rels(&sheet_part, &sheet_rels);

            let drawing_part = PackURI::from_membername("xl/drawings/drawing1.xml");
            let mut drawing = String::from(
                r#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            );
            let mut drawing_rels = Relationships::new("/xl/drawings");
            for (i, (cell, png)) in self.drawing_images.iter().enumerate() {
                let media = format!("xl/media/image{}.png", i + 1);
                pkg.set_part(&PackURI::from_membername(&media), png.clone(), None);
                let r_id = drawing_rels.add(RT::IMAGE, &format!("../media/image{}.png", i + 1));
                write!(
                    drawing,
                    r#"<xdr:oneCellAnchor><xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:ext cx="914400" cy="914400"/><xdr:pic><xdr:blipFill><a:blip r:embed="{}"/></xdr:blipFill></xdr:pic><xdr:clientData/></xdr:oneCellAnchor>"#,
                    cell.column,
                    cell.row - 1,
                    r_id
                )
                .unwrap();
            }
            drawing.push_str("</xdr:wsDr>");
            pkg.set_part(&drawing_part, drawing.into_bytes(), None);
            pkg.set_rels(&drawing_part, &drawing_rels);
        }

        if !self.rich_images.is_empty() {
            let n = self.rich_images.len();
            let mut metadata = String::from(
                r#"<metadata xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:xlrd="http://schemas.microsoft.com/office/spreadsheetml/2017/richdata"><metadataTypes count="1"><metadataType name="XLRICHVALUE"/></metadataTypes><futureMetadata name="XLRICHVALUE">"#,
            );
            for k in 0..n {
                write!(metadata, r#"<bk><extLst><ext uri="x"><xlrd:rvb i="{}"/></ext></extLst></bk>"#, k).unwrap();
            }
            metadata.push_str("</futureMetadata><valueMetadata>");
            for k in 0..n {
                write!(metadata, r#"<bk><rc t="1" v="{}"/></bk>"#, k).unwrap();
            }
            metadata.push_str("</valueMetadata></metadata>");

            let mut values = String::from(r#"<rvData xmlns="http://schemas.microsoft.com/office/spreadsheetml/2017/richdata">"#);
            let mut rel_list = String::from(
                r#"<richValueRels xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            );
            let mut rels = Relationships::new("/xl/richData");
            for (k, (_, png)) in self.rich_images.iter().enumerate() {
                write!(values, r#"<rv s="0"><v>{}</v><v>5</v></rv>"#, k).unwrap();
                let media = format!("xl/media/rich{}.png", k + 1);
                pkg.set_part(&PackURI::from_membername(&media), png.clone(), None);
                let r_id = rels.add(RT::IMAGE, &format!("../media/rich{}.png", k + 1));
                write!(rel_list, r#"<rel r:id="{}"/>"#, r_id).unwrap();
            }
            values.push_str("</rvData>");
            rel_list.push_str("</richValueRels>");

            pkg.set_part(&PackURI::from_membername("xl/metadata.xml"), metadata.into_bytes(), None);
            pkg.set_part(&PackURI::from_membername("xl/richData/rdrichvalue.xml"), values.into_bytes(), None);
            pkg.set_part(
                &PackURI::from_membername("xl/richData/rdrichvaluestructure.xml"),
                br#"<rvStructures><s t="_localImage"><k n="_rvRel:LocalImageIdentifier" t="i"/><k n="CalcOrigin" t="i"/></s></rvStructures>"#.to_vec(),
                None,
            );
            let rel_part = PackURI::from_membername("xl/richData/richValueRel.xml");
            pkg.set_part(&rel_part, rel_list.into_bytes(), None);
            pkg.set_rels(&rel_part, &rels);
        }

        pkg
    }
}
