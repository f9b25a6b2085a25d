/// Base shape types for PowerPoint slides.
///
/// A slide's `p:spTree` is split into byte ranges, one per top-level shape,
/// so that untouched shapes can be carried over verbatim and edited shapes
/// can be spliced in place.
use crate::common::xml::{attr_i64, attr_value, find_children};
use crate::ooxml::error::{OoxmlError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::ops::Range;

/// Shape type enumeration.
///
/// Indicates what kind of shape this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// A text or auto shape (p:sp)
    Shape,
    /// A picture shape (p:pic)
    Picture,
    /// A graphic frame containing a table or chart (p:graphicFrame)
    GraphicFrame,
    /// A group shape (p:grpSp)
    GroupShape,
    /// A connector shape (p:cxnSp)
    Connector,
    /// Unknown or unsupported shape type
    Unknown,
}

impl ShapeType {
    /// Classify a direct child of `p:spTree` by local name.
    ///
    /// Returns `None` for the tree's own property elements, which are not
    /// shapes.
    pub fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"nvGrpSpPr" | b"grpSpPr" | b"extLst" => None,
            b"sp" => Some(Self::Shape),
            b"pic" => Some(Self::Picture),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"grpSp" => Some(Self::GroupShape),
            b"cxnSp" => Some(Self::Connector),
            _ => Some(Self::Unknown),
        }
    }
}

/// Shape geometry (position and size) in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShapeGeometry {
    /// X position in EMUs
    pub x: i64,
    /// Y position in EMUs
    pub y: i64,
    /// Width in EMUs
    pub cx: i64,
    /// Height in EMUs
    pub cy: i64,
}

impl ShapeGeometry {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }
}

/// Base shape containing common properties.
///
/// The shape does not own its markup; `range` indexes into the slide XML
/// the shape was parsed from.
#[derive(Debug, Clone)]
pub struct BaseShape {
    range: Range<usize>,
    shape_type: ShapeType,
    id: u32,
    name: String,
    geometry: Option<ShapeGeometry>,
    has_text_frame: bool,
}

impl BaseShape {
    /// Read the properties of one shape element.
    ///
    /// `slide_xml[range]` must be the complete shape element.
    pub fn parse(slide_xml: &[u8], range: Range<usize>, shape_type: ShapeType) -> Result<Self> {
        let xml = slide_xml
            .get(range.clone())
            .ok_or_else(|| OoxmlError::InvalidFormat("shape range out of bounds".to_string()))?;

        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut id = 0u32;
        let mut name = None;
        let mut in_xfrm = false;
        let mut xfrm_done = false;
        let mut offset = None;
        let mut extent = None;
        let mut has_text_frame = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"cNvPr" if name.is_none() => {
                        id = attr_i64(&e, b"id").and_then(|v| u32::try_from(v).ok()).unwrap_or(0);
                        name = Some(attr_value(&e, b"name").unwrap_or_default());
                    },
                    b"xfrm" if !xfrm_done => in_xfrm = true,
                    b"off" if in_xfrm => {
                        offset = Some((attr_i64(&e, b"x").unwrap_or(0), attr_i64(&e, b"y").unwrap_or(0)));
                    },
                    b"ext" if in_xfrm => {
                        extent = Some((attr_i64(&e, b"cx").unwrap_or(0), attr_i64(&e, b"cy").unwrap_or(0)));
                    },
                    b"txBody" => has_text_frame = true,
                    _ => {},
                },
                Event::End(e) => {
                    if e.local_name().as_ref() == b"xfrm" && in_xfrm {
                        in_xfrm = false;
                        xfrm_done = true;
                    }
                },
                Event::Eof => break,
                _ => {},
            }
            buf.clear();
        }

        let geometry = match (offset, extent) {
            (Some((x, y)), Some((cx, cy))) => Some(ShapeGeometry { x, y, cx, cy }),
            (None, Some((cx, cy))) => Some(ShapeGeometry { x: 0, y: 0, cx, cy }),
            _ => None,
        };

        Ok(Self {
            range,
            shape_type,
            id,
            name: name.unwrap_or_default(),
            geometry,
            has_text_frame,
        })
    }

    /// Get the shape type.
    #[inline]
    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    /// Shape name from `<p:cNvPr name>`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shape id from `<p:cNvPr id>`; 0 when absent.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Position and size, when the shape carries its own `a:xfrm`.
    ///
    /// Placeholders that inherit geometry from their layout have none.
    #[inline]
    pub fn geometry(&self) -> Option<ShapeGeometry> {
        self.geometry
    }

    #[inline]
    pub fn has_text_frame(&self) -> bool {
        self.has_text_frame
    }

    /// Byte range of the shape element inside the slide XML.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// The shape's markup within `slide_xml`.
    pub fn xml<'a>(&self, slide_xml: &'a [u8]) -> &'a [u8] {
        &slide_xml[self.range.clone()]
    }
}

/// The top-level shapes of one slide, in document order.
#[derive(Debug, Clone, Default)]
pub struct ShapeTree {
    shapes: Vec<BaseShape>,
    /// Offset just before `</p:spTree>`, where new shapes are appended
    insert_at: usize,
    /// Largest `cNvPr@id` anywhere on the slide, nested shapes included
    max_id: u32,
}

impl ShapeTree {
    /// Split the slide's `p:spTree` into shapes.
    pub fn parse(slide_xml: &[u8]) -> Result<Self> {
        let (tree, children) = find_children(slide_xml, b"spTree")?
            .ok_or_else(|| OoxmlError::InvalidFormat("slide has no p:spTree".to_string()))?;
        let insert_at = tree
            .inner
            .as_ref()
            .map(|inner| inner.end)
            .ok_or_else(|| OoxmlError::InvalidFormat("p:spTree is empty".to_string()))?;

        let mut shapes = Vec::with_capacity(children.len());
        for child in children {
            if let Some(shape_type) = ShapeType::from_local_name(&child.name) {
                shapes.push(BaseShape::parse(slide_xml, child.outer, shape_type)?);
            }
        }

        Ok(Self {
            shapes,
            insert_at,
            max_id: max_shape_id(slide_xml)?,
        })
    }

    #[inline]
    pub fn shapes(&self) -> &[BaseShape] {
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

    #[inline]
    pub fn insert_at(&self) -> usize {
        self.insert_at
    }

    #[inline]
    pub fn max_id(&self) -> u32 {
        self.max_id
    }
}

fn max_shape_id(xml: &[u8]) -> Result<u32> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut max_id = 0u32;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"cNvPr" => {
                if let Some(id) = attr_i64(&e, b"id").and_then(|v| u32::try_from(v).ok()) {
                    max_id = max_id.max(id);
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok(max_id)
}
