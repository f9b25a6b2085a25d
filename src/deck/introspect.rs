//! Template introspection: what the template slide's shapes look like.
//!
//! The index is built once per run from the template's first slide and is
//! read-only afterwards. Shapes are identified by name; when several shapes
//! share a name, the first one in document order wins.

use crate::common::RGBColor;
use crate::common::Result;
use crate::ooxml::pptx::{Paragraph, ShapeGeometry, ShapeType, Slide, TextAlign, TextFormat, TextFrame};
use std::collections::HashMap;
use std::ops::Range;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A picture
    Image,
    /// A shape with a text body
    Text,
    /// Groups, graphic frames, connectors, shapes without text
    Other,
}

/// Typography snapshot of one template paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphMetadata {
    pub index: usize,
    /// Template text is empty or whitespace
    pub is_spacer: bool,
    pub font_name: Option<String>,
    /// Points
    pub font_size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<RGBColor>,
    pub alignment: Option<TextAlign>,
    pub level: u32,
    pub text: String,
}

impl ParagraphMetadata {
    fn from_paragraph(index: usize, paragraph: &Paragraph) -> Self {
        let format = &paragraph.format;
        Self {
            index,
            is_spacer: paragraph.is_spacer(),
            font_name: format.font.clone(),
            font_size: format.size,
            bold: format.bold,
            italic: format.italic,
            color: format.color,
            alignment: paragraph.alignment,
            level: paragraph.level,
            text: paragraph.text.clone(),
        }
    }

    /// Run formatting to reuse for new text in this slot.
    pub fn text_format(&self) -> TextFormat {
        TextFormat {
            font: self.font_name.clone(),
            size: self.font_size,
            bold: self.bold,
            italic: self.italic,
            color: self.color,
        }
    }
}

/// One top-level shape of the template slide.
#[derive(Debug, Clone)]
pub struct ShapeMetadata {
    pub name: String,
    pub kind: ShapeKind,
    /// Position and size in EMUs; `None` when the shape inherits them from
    /// its layout placeholder
    pub bounds: Option<ShapeGeometry>,
    pub paragraphs: Vec<ParagraphMetadata>,
    /// Byte range in the template slide XML
    range: Range<usize>,
    frame: Option<TextFrame>,
}

impl ShapeMetadata {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Parsed text body, for rewriting.
    #[inline]
    pub fn text_frame(&self) -> Option<&TextFrame> {
        self.frame.as_ref()
    }
}

/// Name-addressable view of a template slide.
#[derive(Debug, Clone, Default)]
pub struct TemplateIndex {
    shapes: Vec<ShapeMetadata>,
    by_name: HashMap<String, usize>,
}

impl TemplateIndex {
    /// Build the index for a slide. A slide without shapes gives an empty
    /// index.
    pub fn introspect(slide: &Slide) -> Result<Self> {
        let xml = slide.xml();
        let mut index = Self::default();

        for shape in slide.shapes() {
            let frame = if shape.has_text_frame() {
                TextFrame::parse(shape.xml(xml))?
            } else {
                None
            };
            let paragraphs: Vec<ParagraphMetadata> = frame
                .as_ref()
                .map(|f| {
                    f.paragraphs()
                        .iter()
                        .enumerate()
                        .map(|(i, p)| ParagraphMetadata::from_paragraph(i, p))
                        .collect()
                })
                .unwrap_or_default();

            let kind = match shape.shape_type() {
                ShapeType::Picture => ShapeKind::Image,
                _ if frame.is_some() => ShapeKind::Text,
                _ => ShapeKind::Other,
            };

            index
                .by_name
                .entry(shape.name().to_string())
                .or_insert(index.shapes.len());
            index.shapes.push(ShapeMetadata {
                name: shape.name().to_string(),
                kind,
                bounds: shape.geometry(),
                paragraphs,
                range: shape.range(),
                frame,
            });
        }

        debug!(
            slide = %slide.partname(),
            shapes = index.shapes.len(),
            "introspected template slide"
        );
        Ok(index)
    }

    /// Shape with exactly this name.
    pub fn get(&self, name: &str) -> Option<&ShapeMetadata> {
        self.by_name.get(name).map(|&i| &self.shapes[i])
    }

    /// Exact name first, then the first shape whose name contains `name`
    /// ignoring case.
    pub fn find_loose(&self, name: &str) -> Option<&ShapeMetadata> {
        self.find_loose_where(name, |_| true)
    }

    /// [`find_loose`](Self::find_loose) restricted to shapes that pass
    /// `accept`; rejected shapes do not hide later matches.
    pub fn find_loose_where(&self, name: &str, accept: impl Fn(&ShapeMetadata) -> bool) -> Option<&ShapeMetadata> {
        if let Some(shape) = self.shapes.iter().find(|s| s.name == name && accept(*s)) {
            return Some(shape);
        }
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.shapes
            .iter()
            .find(|s| s.name.to_lowercase().contains(&needle) && accept(*s))
    }

    /// Shapes in document order.
    #[inline]
    pub fn shapes(&self) -> &[ShapeMetadata] {
        &self.shapes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
