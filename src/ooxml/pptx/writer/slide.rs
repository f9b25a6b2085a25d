/// Slide writer: edits a cloned slide or fills a blank one.
use crate::common::xml::splice;
use crate::ooxml::error::Result;
use crate::ooxml::opc::Relationships;
use crate::ooxml::opc::constants::relationship_type as RT;
use crate::ooxml::pptx::format::{Autofit, ImageFormat};
use crate::ooxml::pptx::shapes::{ShapeGeometry, ShapeTree};
use crate::ooxml::pptx::slide::Slide;
use crate::ooxml::pptx::template::blank_slide_xml;
use crate::ooxml::pptx::writer::shape::{MutableShape, ParagraphSpec};
use std::ops::Range;

/// Base URI of generated slide parts; relationship targets are relative to
/// it.
pub const SLIDES_BASE_URI: &str = "/ppt/slides";

/// An image waiting to be stored in the package under a reserved rId.
#[derive(Debug, Clone)]
pub struct SlideMedia {
    pub rel_id: String,
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

/// A finished slide, ready to be added to a presentation.
#[derive(Debug, Clone)]
pub struct BuiltSlide {
    pub xml: Vec<u8>,
    pub rels: Relationships,
    pub media: Vec<SlideMedia>,
}

/// A slide under construction.
///
/// Starts from a template slide (every shape kept verbatim) or from an
/// empty slide. Shapes of the original markup can be replaced or removed by
/// byte range; new shapes are appended at the end of the shape tree so they
/// draw on top.
#[derive(Debug, Clone)]
pub struct MutableSlide {
    xml: Vec<u8>,
    insert_at: usize,
    edits: Vec<(Range<usize>, String)>,
    appended: String,
    next_shape_id: u32,
    rels: Relationships,
    next_rel_id: u32,
    media: Vec<SlideMedia>,
}

impl MutableSlide {
    /// Clone a template slide. The notes page relationship is not carried
    /// over; notes of template slides are not part of the output.
    pub fn from_template(slide: &Slide) -> Self {
        let tree = slide.shape_tree();
        let mut rels = slide.rels().clone();
        rels.retain(|rel| rel.reltype() != RT::NOTES_SLIDE);
        let next_rel_id = rels.max_r_id_number() + 1;
        Self {
            xml: slide.xml().to_vec(),
            insert_at: tree.insert_at(),
            edits: Vec::new(),
            appended: String::new(),
            next_shape_id: tree.max_id() + 1,
            rels,
            next_rel_id,
            media: Vec::new(),
        }
    }

    /// An empty slide bound to the layout at `layout_target` (relative to
    /// the slides directory, e.g. `../slideLayouts/slideLayout7.xml`).
    pub fn blank(layout_target: &str) -> Result<Self> {
        let xml = blank_slide_xml().into_bytes();
        let tree = ShapeTree::parse(&xml)?;
        let mut rels = Relationships::new(SLIDES_BASE_URI);
        rels.add(RT::SLIDE_LAYOUT, layout_target);
        let next_rel_id = rels.max_r_id_number() + 1;

        Ok(Self {
            insert_at: tree.insert_at(),
            xml,
            edits: Vec::new(),
            appended: String::new(),
            next_shape_id: tree.max_id() + 1,
            rels,
            next_rel_id,
            media: Vec::new(),
        })
    }

    /// The markup the slide started from; shape ranges index into it.
    #[inline]
    pub fn source_xml(&self) -> &[u8] {
        &self.xml
    }

    /// Allocate a shape id unused on this slide.
    pub fn next_shape_id(&mut self) -> u32 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    /// Replace an original shape with new markup.
    pub fn replace_shape(&mut self, range: Range<usize>, xml: String) {
        self.edits.push((range, xml));
    }

    pub fn remove_shape(&mut self, range: Range<usize>) {
        self.edits.push((range, String::new()));
    }

    /// Register an image and return the rId the picture should embed.
    pub fn add_media(&mut self, data: Vec<u8>, format: ImageFormat) -> String {
        let rel_id = format!("rId{}", self.next_rel_id);
        self.next_rel_id += 1;
        self.media.push(SlideMedia {
            rel_id: rel_id.clone(),
            data,
            format,
        });
        rel_id
    }

    /// Picture markup for an image, registering the image.
    ///
    /// The markup is returned rather than appended so it can also take the
    /// place of a template shape.
    pub fn picture_xml(
        &mut self,
        name: Option<&str>,
        geometry: ShapeGeometry,
        data: Vec<u8>,
        format: ImageFormat,
        description: &str,
    ) -> Result<String> {
        let rel_id = self.add_media(data, format);
        let shape_id = self.next_shape_id();
        let shape = MutableShape::new_picture(shape_id, name, geometry, rel_id, description);
        let mut xml = String::with_capacity(512);
        shape.to_xml(&mut xml)?;
        Ok(xml)
    }

    /// Append a picture on top of the existing shapes.
    pub fn add_picture(
        &mut self,
        geometry: ShapeGeometry,
        data: Vec<u8>,
        format: ImageFormat,
        description: &str,
    ) -> Result<()> {
        let xml = self.picture_xml(None, geometry, data, format, description)?;
        self.appended.push_str(&xml);
        Ok(())
    }

    /// Append a text box.
    pub fn add_text_box(
        &mut self,
        geometry: ShapeGeometry,
        paragraphs: Vec<ParagraphSpec>,
        autofit: Autofit,
    ) -> Result<()> {
        let shape_id = self.next_shape_id();
        let shape = MutableShape::new_text_box(shape_id, None, geometry, paragraphs, autofit);
        shape.to_xml(&mut self.appended)
    }

    /// Number of images registered so far.
    #[inline]
    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    /// Apply all edits and hand over markup, relationships and images.
    pub fn finish(mut self) -> BuiltSlide {
        if !self.appended.is_empty() {
            let at = self.insert_at;
            self.edits.push((at..at, std::mem::take(&mut self.appended)));
        }
        BuiltSlide {
            xml: splice(&self.xml, self.edits),
            rels: self.rels,
            media: self.media,
        }
    }
}
