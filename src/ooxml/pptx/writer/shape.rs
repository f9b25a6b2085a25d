/// Shape XML generation for slides.
use crate::common::unit::pt_to_centipoints;
use crate::common::xml::escape_xml;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::format::{Autofit, TextAlign, TextFormat};
use crate::ooxml::pptx::shapes::ShapeGeometry;
use std::fmt::Write as FmtWrite;

/// Content and formatting of one generated paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphSpec {
    /// Text; `\n` becomes a line break
    pub text: String,
    pub alignment: Option<TextAlign>,
    pub level: u32,
    /// Space after the paragraph, in points
    pub space_after: Option<f64>,
    pub format: TextFormat,
}

impl ParagraphSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Write this paragraph as an `a:p` element.
    pub fn write_xml(&self, xml: &mut String) -> Result<()> {
        xml.push_str("<a:p>");

        let spacing = self.space_after.filter(|pt| *pt > 0.0);
        if self.alignment.is_some() || self.level > 0 || spacing.is_some() {
            xml.push_str("<a:pPr");
            if self.level > 0 {
                write!(xml, r#" lvl="{}""#, self.level).map_err(|e| OoxmlError::Xml(e.to_string()))?;
            }
            if let Some(align) = self.alignment {
                write!(xml, r#" algn="{}""#, align.as_attr()).map_err(|e| OoxmlError::Xml(e.to_string()))?;
            }
            match spacing {
                Some(pt) => {
                    write!(
                        xml,
                        r#"><a:spcAft><a:spcPts val="{}"/></a:spcAft></a:pPr>"#,
                        pt_to_centipoints(pt)
                    )
                    .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                },
                None => xml.push_str("/>"),
            }
        }

        if !self.text.is_empty() {
            for (i, line) in self.text.split('\n').enumerate() {
                if i > 0 {
                    xml.push_str("<a:br>");
                    write_run_properties(xml, "a:rPr", &self.format)?;
                    xml.push_str("</a:br>");
                }
                if line.is_empty() {
                    continue;
                }
                xml.push_str("<a:r>");
                write_run_properties(xml, "a:rPr", &self.format)?;
                write!(xml, "<a:t>{}</a:t>", escape_xml(line)).map_err(|e| OoxmlError::Xml(e.to_string()))?;
                xml.push_str("</a:r>");
            }
        }

        write_run_properties(xml, "a:endParaRPr", &self.format)?;
        xml.push_str("</a:p>");
        Ok(())
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(128 + self.text.len());
        self.write_xml(&mut xml)?;
        Ok(xml)
    }
}

/// Write `a:rPr`-shaped run properties under the given element name.
fn write_run_properties(xml: &mut String, tag: &str, format: &TextFormat) -> Result<()> {
    write!(xml, r#"<{} lang="en-US""#, tag).map_err(|e| OoxmlError::Xml(e.to_string()))?;

    if let Some(size) = format.size {
        write!(xml, r#" sz="{}""#, pt_to_centipoints(size)).map_err(|e| OoxmlError::Xml(e.to_string()))?;
    }
    if let Some(bold) = format.bold {
        xml.push_str(if bold { r#" b="1""# } else { r#" b="0""# });
    }
    if let Some(italic) = format.italic {
        xml.push_str(if italic { r#" i="1""# } else { r#" i="0""# });
    }
    xml.push_str(r#" dirty="0""#);

    if format.color.is_none() && format.font.is_none() {
        xml.push_str("/>");
        return Ok(());
    }
    xml.push('>');

    // CT_TextCharacterProperties: fill comes before the typefaces.
    if let Some(color) = format.color {
        write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color.to_hex())
            .map_err(|e| OoxmlError::Xml(e.to_string()))?;
    }
    if let Some(ref font) = format.font {
        write!(xml, r#"<a:latin typeface="{}"/>"#, escape_xml(font)).map_err(|e| OoxmlError::Xml(e.to_string()))?;
    }

    write!(xml, "</{}>", tag).map_err(|e| OoxmlError::Xml(e.to_string()))?;
    Ok(())
}

/// A shape to be written onto a slide.
#[derive(Debug, Clone)]
pub struct MutableShape {
    /// Shape ID, unique within the slide
    pub(crate) shape_id: u32,
    pub(crate) name: String,
    pub(crate) geometry: ShapeGeometry,
    pub(crate) shape_type: ShapeType,
}

#[derive(Debug, Clone)]
pub(crate) enum ShapeType {
    TextBox {
        paragraphs: Vec<ParagraphSpec>,
        autofit: Autofit,
    },
    Picture {
        rel_id: String,
        description: String,
    },
}

impl MutableShape {
    /// Create a new text box shape.
    pub fn new_text_box(
        shape_id: u32,
        name: Option<&str>,
        geometry: ShapeGeometry,
        paragraphs: Vec<ParagraphSpec>,
        autofit: Autofit,
    ) -> Self {
        Self {
            shape_id,
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| format!("TextBox {}", shape_id.saturating_sub(1))),
            geometry,
            shape_type: ShapeType::TextBox { paragraphs, autofit },
        }
    }

    /// Create a new picture shape referencing an image relationship.
    pub fn new_picture(
        shape_id: u32,
        name: Option<&str>,
        geometry: ShapeGeometry,
        rel_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            shape_id,
            name: name
                .map(str::to_string)
                .unwrap_or_else(|| format!("Picture {}", shape_id.saturating_sub(1))),
            geometry,
            shape_type: ShapeType::Picture {
                rel_id: rel_id.into(),
                description: description.into(),
            },
        }
    }

    #[inline]
    pub fn shape_id(&self) -> u32 {
        self.shape_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn write_xfrm(&self, xml: &mut String) -> Result<()> {
        let g = &self.geometry;
        xml.push_str("<a:xfrm>");
        write!(xml, r#"<a:off x="{}" y="{}"/>"#, g.x, g.y).map_err(|e| OoxmlError::Xml(e.to_string()))?;
        write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, g.cx.max(0), g.cy.max(0))
            .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        xml.push_str("</a:xfrm>");
        Ok(())
    }

    /// Generate XML for this shape.
    pub fn to_xml(&self, xml: &mut String) -> Result<()> {
        match &self.shape_type {
            ShapeType::TextBox { paragraphs, autofit } => {
                xml.push_str("<p:sp>");
                xml.push_str("<p:nvSpPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}"/>"#,
                    self.shape_id,
                    escape_xml(&self.name)
                )
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                xml.push_str("<p:cNvSpPr txBox=\"1\"/>");
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvSpPr>");

                xml.push_str("<p:spPr>");
                self.write_xfrm(xml)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
                xml.push_str("<a:noFill/>");
                xml.push_str("</p:spPr>");

                xml.push_str("<p:txBody>");
                xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0">"#);
                match autofit {
                    Autofit::ShapeToFitText => xml.push_str("<a:spAutoFit/>"),
                    Autofit::ShrinkTextOnOverflow => xml.push_str("<a:normAutofit/>"),
                }
                xml.push_str("</a:bodyPr>");
                xml.push_str("<a:lstStyle/>");
                if paragraphs.is_empty() {
                    xml.push_str(r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
                }
                for paragraph in paragraphs {
                    paragraph.write_xml(xml)?;
                }
                xml.push_str("</p:txBody>");

                xml.push_str("</p:sp>");
            },
            ShapeType::Picture { rel_id, description } => {
                xml.push_str("<p:pic>");
                xml.push_str("<p:nvPicPr>");
                write!(
                    xml,
                    r#"<p:cNvPr id="{}" name="{}" descr="{}"/>"#,
                    self.shape_id,
                    escape_xml(&self.name),
                    escape_xml(description)
                )
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
                xml.push_str("<p:nvPr/>");
                xml.push_str("</p:nvPicPr>");

                xml.push_str("<p:blipFill>");
                write!(xml, r#"<a:blip r:embed="{}"/>"#, escape_xml(rel_id))
                    .map_err(|e| OoxmlError::Xml(e.to_string()))?;
                xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
                xml.push_str("</p:blipFill>");

                xml.push_str("<p:spPr>");
                self.write_xfrm(xml)?;
                xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
                xml.push_str("</p:spPr>");
                xml.push_str("</p:pic>");
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RGBColor;
    use crate::ooxml::pptx::shapes::TextFrame;

    #[test]
    fn test_paragraph_xml() {
        let spec = ParagraphSpec {
            text: "Tom & Jerry\nsecond".to_string(),
            alignment: Some(TextAlign::Center),
            level: 0,
            space_after: Some(6.0),
            format: TextFormat {
                font: Some("Calibri".to_string()),
                size: Some(14.0),
                bold: Some(true),
                italic: Some(false),
                color: Some(RGBColor::new(0xFF, 0, 0)),
            },
        };
        let xml = spec.to_xml().unwrap();
        assert!(xml.starts_with(r#"<a:p><a:pPr algn="ctr"><a:spcAft><a:spcPts val="600"/></a:spcAft></a:pPr>"#));
        assert!(xml.contains(
            r#"<a:rPr lang="en-US" sz="1400" b="1" i="0" dirty="0"><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill><a:latin typeface="Calibri"/></a:rPr><a:t>Tom &amp; Jerry</a:t>"#
        ));
        assert_eq!(xml.matches("<a:br>").count(), 1);
        assert!(xml.ends_with("</a:endParaRPr></a:p>"));
    }

    #[test]
    fn test_empty_paragraph_has_no_runs() {
        let xml = ParagraphSpec::new("").to_xml().unwrap();
        assert_eq!(xml, r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#);
    }

    #[test]
    fn test_text_box_round_trips_through_text_frame() {
        let paragraphs = vec![ParagraphSpec::new("Brand"), ParagraphSpec::new(""), ParagraphSpec::new("Desc")];
        let shape = MutableShape::new_text_box(
            5,
            None,
            ShapeGeometry::new(457200, 4572000, 6000000, 914400),
            paragraphs,
            Autofit::ShrinkTextOnOverflow,
        );
        let mut xml = String::new();
        shape.to_xml(&mut xml).unwrap();
        assert!(xml.contains(r#"<p:cNvPr id="5" name="TextBox 4"/>"#));
        assert!(xml.contains("<a:normAutofit/>"));

        let frame = TextFrame::parse(xml.as_bytes()).unwrap().unwrap();
        let texts: Vec<&str> = frame.paragraphs().iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Brand", "", "Desc"]);
    }

    #[test]
    fn test_picture_xml() {
        let shape = MutableShape::new_picture(
            3,
            Some("Rectangle 1"),
            ShapeGeometry::new(1, 2, 3, 4),
            "rId4",
            "image<1>",
        );
        let mut xml = String::new();
        shape.to_xml(&mut xml).unwrap();
        assert!(xml.contains(r#"<p:cNvPr id="3" name="Rectangle 1" descr="image&lt;1&gt;"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId4"/>"#));
        assert!(xml.contains(r#"<a:off x="1" y="2"/><a:ext cx="3" cy="4"/>"#));
    }
}
