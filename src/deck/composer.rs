//! Slide composer: one populated slide per row.
//!
//! The generation mode is resolved once per run into a [`SlideComposer`];
//! every variant composes a row the same way from the caller's point of
//! view. Problems with a row's data are recorded in its [`SlideReport`] and
//! never fail the row. An `Err` from [`SlideComposer::compose`] means the
//! slide markup itself could not be written.

use crate::common::{Error, Result};
use crate::deck::config::{GenerationMode, ImageAlignment, ImageElement, SizingMode, SlideLayoutConfig, TextGroup};
use crate::deck::introspect::{ShapeKind, ShapeMetadata, TemplateIndex};
use crate::deck::layout::{self, Rect};
use crate::deck::mapper::{self, SlotAssignment};
use crate::deck::report::{RowWarning, SlideReport};
use crate::deck::row::{ColumnContentMap, ImageLookup, ResolvedImage, RowRecord};
use crate::ooxml::pptx::{BuiltSlide, MutableSlide, ParagraphSpec, Slide};
use std::collections::HashSet;
use tracing::debug;

/// A composed slide and what happened while composing it.
#[derive(Debug, Clone)]
pub struct ComposedSlide {
    pub slide: BuiltSlide,
    pub report: SlideReport,
}

/// Composer for one generation run, selected from the generation mode.
#[derive(Debug)]
pub enum SlideComposer<'a> {
    /// Empty slide, one image and one text block
    BlankSingle(BlankComposer<'a>),
    /// Clone of the template slide, placeholders found by loose name
    TemplateSingle(TemplateComposer<'a>),
    /// Clone of the template slide, named image elements and text groups
    TemplateMulti(TemplateComposer<'a>),
}

impl<'a> SlideComposer<'a> {
    /// Select the composer for `mode`. `layout_target` is the blank layout
    /// relative to the slides directory; only blank modes use it.
    ///
    /// Blank slides have no named elements to fill, so multi-element blank
    /// mode is composed as single-element from the first image element and
    /// the columns of every text group; this is reported once in the
    /// returned run warnings. Template modes need `template`.
    pub fn for_mode(
        mode: GenerationMode,
        config: &'a SlideLayoutConfig,
        layout_target: String,
        template: Option<(&'a Slide, &'a TemplateIndex)>,
    ) -> Result<(Self, Vec<RowWarning>)> {
        let mut run_warnings = Vec::new();
        let composer = match mode {
            GenerationMode::BlankSingle => Self::BlankSingle(BlankComposer {
                config,
                layout_target,
                image: single_image_element(config),
                text_columns: config.text_columns.clone(),
                separator: config.text_separator.clone(),
            }),
            GenerationMode::BlankMulti => {
                run_warnings.push(RowWarning::UnsupportedMode {
                    mode: "blank/multi".to_string(),
                    fallback: "blank/single".to_string(),
                });
                Self::BlankSingle(BlankComposer {
                    config,
                    layout_target,
                    image: config.image_elements().into_iter().next(),
                    text_columns: config.all_text_columns(),
                    separator: config.text_separator.clone(),
                })
            },
            GenerationMode::TemplateSingle | GenerationMode::TemplateMulti => {
                let (slide, index) = template.ok_or_else(|| {
                    Error::Config("template mode requires a template presentation".to_string())
                })?;
                let inner = TemplateComposer { config, slide, index };
                if mode == GenerationMode::TemplateSingle {
                    Self::TemplateSingle(inner)
                } else {
                    Self::TemplateMulti(inner)
                }
            },
        };
        Ok((composer, run_warnings))
    }

    pub fn mode(&self) -> GenerationMode {
        match self {
            Self::BlankSingle(_) => GenerationMode::BlankSingle,
            Self::TemplateSingle(_) => GenerationMode::TemplateSingle,
            Self::TemplateMulti(_) => GenerationMode::TemplateMulti,
        }
    }

    /// Compose the slide of one row.
    pub fn compose(&self, row: &RowRecord) -> Result<ComposedSlide> {
        match self {
            Self::BlankSingle(c) => c.compose(row),
            Self::TemplateSingle(c) => c.compose_single(row),
            Self::TemplateMulti(c) => c.compose_multi(row),
        }
    }
}

/// The image element of single-element mode, if an image column is set.
fn single_image_element(config: &SlideLayoutConfig) -> Option<ImageElement> {
    (!config.image_column.trim().is_empty()).then(|| ImageElement {
        column: config.image_column.clone(),
        placeholder_name: config.image_placeholder.clone(),
        sizing_mode: Some(config.image_sizing),
        alignment: Some(config.image_alignment()),
    })
}

/// Composes rows onto empty slides.
#[derive(Debug)]
pub struct BlankComposer<'a> {
    config: &'a SlideLayoutConfig,
    layout_target: String,
    image: Option<ImageElement>,
    text_columns: Vec<String>,
    separator: Option<String>,
}

impl BlankComposer<'_> {
    fn compose(&self, row: &RowRecord) -> Result<ComposedSlide> {
        let mut slide = MutableSlide::blank(&self.layout_target)?;
        let mut report = SlideReport::new(row.row_index, row.sheet_row);

        if let Some(element) = &self.image
            && let Some(image) = row_image(row, &element.column, &mut report)
        {
            let bbox = layout::blank_image_box(self.config);
            let rect = place(image, bbox, element, self.config);
            slide.add_picture(rect.to_geometry(), image.data.clone(), image.format, &image.label)?;
            report.has_image = true;
        }

        let texts = mapper::join_texts(&row.texts.select(&self.text_columns), self.separator.as_deref());
        report.text_added = add_flow_text(&mut slide, self.config, &texts)?;

        Ok(ComposedSlide {
            slide: slide.finish(),
            report,
        })
    }
}

/// Composes rows onto clones of the template slide.
#[derive(Debug)]
pub struct TemplateComposer<'a> {
    config: &'a SlideLayoutConfig,
    slide: &'a Slide,
    index: &'a TemplateIndex,
}

/// Shapes of the template slide already replaced on this clone, by range
/// start.
type Replaced = HashSet<usize>;

impl TemplateComposer<'_> {
    fn compose_single(&self, row: &RowRecord) -> Result<ComposedSlide> {
        let config = self.config;
        let mut slide = MutableSlide::from_template(self.slide);
        let mut report = SlideReport::new(row.row_index, row.sheet_row);
        let mut replaced = Replaced::new();

        if let Some(element) = single_image_element(config) {
            let placeholder = self.lookup_single(&config.image_placeholder, &mut report, |_| true);
            if let Some(image) = row_image(row, &element.column, &mut report) {
                match placeholder {
                    Some(shape) => {
                        self.replace_with_picture(&mut slide, shape, image, &element, &mut replaced)?;
                    },
                    None => {
                        let rect = place(image, layout::blank_image_box(config), &element, config);
                        slide.add_picture(rect.to_geometry(), image.data.clone(), image.format, &image.label)?;
                    },
                }
                report.has_image = true;
            }
        }

        let texts = mapper::join_texts(&row.texts.select(&config.text_columns), config.text_separator.as_deref());
        if !config.text_columns.is_empty() {
            let target = self.lookup_single(&config.text_placeholder, &mut report, |s| s.kind == ShapeKind::Text);
            match target {
                Some(shape) if !replaced.contains(&shape.range().start) => {
                    let assignment = mapper::map(&shape.paragraphs, &texts);
                    if let Some(warning) = assignment.excess_warning(&shape.name) {
                        report.warn(warning);
                    }
                    report.text_added = self.rewrite_text(&mut slide, shape, &assignment, &mut replaced)?;
                },
                Some(shape) => {
                    debug!(shape = %shape.name, "text placeholder already holds the image");
                    report.text_added = add_flow_text(&mut slide, config, &texts)?;
                },
                None => report.text_added = add_flow_text(&mut slide, config, &texts)?,
            }
        }

        Ok(ComposedSlide {
            slide: slide.finish(),
            report,
        })
    }

    fn compose_multi(&self, row: &RowRecord) -> Result<ComposedSlide> {
        let config = self.config;
        let mut slide = MutableSlide::from_template(self.slide);
        let mut report = SlideReport::new(row.row_index, row.sheet_row);
        let mut replaced = Replaced::new();

        for element in config.image_elements() {
            if element.placeholder_name.trim().is_empty() || element.column.trim().is_empty() {
                continue;
            }
            let Some(shape) = self.index.get(&element.placeholder_name) else {
                report.warn(RowWarning::PlaceholderNotFound {
                    name: element.placeholder_name.clone(),
                });
                continue;
            };
            if let Some(image) = row_image(row, &element.column, &mut report) {
                self.replace_with_picture(&mut slide, shape, image, &element, &mut replaced)?;
                report.has_image = true;
            }
        }

        let groups: Vec<TextGroup> = config.text_groups();
        let (assignments, warnings) =
            mapper::map_groups(&groups, self.index, &row.texts, config.text_separator.as_deref());
        for warning in warnings {
            report.warn(warning);
        }
        for group in assignments {
            if self.rewrite_text(&mut slide, group.shape, &group.assignment, &mut replaced)? {
                report.text_added = true;
            }
        }

        Ok(ComposedSlide {
            slide: slide.finish(),
            report,
        })
    }

    /// Placeholder of single-element mode, by loose name. A shape that does
    /// not pass `accept` counts as missing. An empty name means no
    /// placeholder and is not reported.
    fn lookup_single(
        &self,
        name: &str,
        report: &mut SlideReport,
        accept: impl Fn(&ShapeMetadata) -> bool,
    ) -> Option<&ShapeMetadata> {
        if name.trim().is_empty() {
            return None;
        }
        let found = self.index.find_loose_where(name, accept);
        if found.is_none() {
            report.warn(RowWarning::PlaceholderNotFound { name: name.to_string() });
        }
        found
    }

    /// Put `image` where `shape` was. The picture takes the shape's name and
    /// is laid out in its bounds, or in the blank-slide image box when the
    /// shape inherits its position.
    fn replace_with_picture(
        &self,
        slide: &mut MutableSlide,
        shape: &ShapeMetadata,
        image: &ResolvedImage,
        element: &ImageElement,
        replaced: &mut Replaced,
    ) -> Result<()> {
        let range = shape.range();
        if !replaced.insert(range.start) {
            debug!(shape = %shape.name, "placeholder already replaced on this slide");
            return Ok(());
        }
        let bbox = shape
            .bounds
            .map(Rect::from_geometry)
            .unwrap_or_else(|| layout::blank_image_box(self.config));
        let rect = place(image, bbox, element, self.config);
        let xml = slide.picture_xml(
            Some(&shape.name),
            rect.to_geometry(),
            image.data.clone(),
            image.format,
            &image.label,
        )?;
        slide.replace_shape(range, xml);
        Ok(())
    }

    /// Rewrite the assigned paragraphs of a text shape. Assigned slots take
    /// the slot's captured typography; every other paragraph is kept as in
    /// the template. Returns whether any non-empty text was written.
    fn rewrite_text(
        &self,
        slide: &mut MutableSlide,
        shape: &ShapeMetadata,
        assignment: &SlotAssignment,
        replaced: &mut Replaced,
    ) -> Result<bool> {
        let Some(frame) = shape.text_frame() else {
            return Ok(false);
        };
        if assignment.fills.is_empty() {
            return Ok(false);
        }
        let range = shape.range();
        if !replaced.insert(range.start) {
            debug!(shape = %shape.name, "text shape already replaced on this slide");
            return Ok(false);
        }

        let spacing = Some(self.config.paragraph_spacing()).filter(|pt| *pt > 0.0);
        let mut replacements: Vec<Option<String>> = vec![None; shape.paragraphs.len()];
        for fill in &assignment.fills {
            let Some(paragraph) = shape.paragraphs.get(fill.paragraph) else {
                continue;
            };
            let spec = ParagraphSpec {
                text: fill.text.clone(),
                alignment: paragraph.alignment,
                level: paragraph.level,
                space_after: spacing,
                format: paragraph.text_format(),
            };
            replacements[fill.paragraph] = Some(spec.to_xml()?);
        }

        let shape_xml = &self.slide.xml()[range.clone()];
        let rewritten = frame.rewrite(shape_xml, &replacements, self.config.overflow.autofit())?;
        let rewritten = String::from_utf8(rewritten).map_err(|e| Error::InvalidFormat(e.to_string()))?;
        slide.replace_shape(range, rewritten);

        Ok(assignment.fills.iter().any(|f| !f.text.trim().is_empty()))
    }
}

/// The image of a row's column, recording a warning when there is none.
fn row_image<'r>(row: &'r RowRecord, column: &str, report: &mut SlideReport) -> Option<&'r ResolvedImage> {
    match row.image(column) {
        ImageLookup::Found(image) => Some(image),
        ImageLookup::Empty => {
            report.warn(RowWarning::ImageMissing {
                column: column.to_string(),
            });
            None
        },
        ImageLookup::Failed(reason) => {
            report.warn(RowWarning::ImageUnresolved {
                column: column.to_string(),
                reason: reason.clone(),
            });
            None
        },
    }
}

/// Lay an image out in `bbox` with the element's sizing and alignment,
/// falling back to the run's settings.
fn place(image: &ResolvedImage, bbox: Rect, element: &ImageElement, config: &SlideLayoutConfig) -> Rect {
    let mode: SizingMode = element.sizing_mode.unwrap_or(config.image_sizing);
    let alignment: ImageAlignment = element.alignment.unwrap_or_else(|| config.image_alignment());
    layout::place_image(
        (image.width_px as f64, image.height_px as f64),
        bbox,
        mode,
        alignment,
    )
}

/// Place texts as free text boxes: auto-flow columns share one container,
/// fixed columns get a container each. Empty texts are skipped. Returns
/// whether anything was placed.
fn add_flow_text(slide: &mut MutableSlide, config: &SlideLayoutConfig, texts: &ColumnContentMap) -> Result<bool> {
    let autofit = config.overflow.autofit();
    let alignment = Some(config.text_alignment.to_text_align());
    let spacing = Some(config.paragraph_spacing()).filter(|pt| *pt > 0.0);

    let mut flow = Vec::new();
    let mut fixed = Vec::new();
    for (column, text) in texts.iter().filter(|(_, t)| !t.trim().is_empty()) {
        let spec = ParagraphSpec {
            text: text.to_string(),
            alignment,
            level: 0,
            space_after: spacing,
            format: config.column_format(column).text_format(config.font_size),
        };
        match config.column_position(column) {
            Some(position) => fixed.push((layout::fixed_text_box(position, config), spec)),
            None => flow.push(spec),
        }
    }

    let placed = !flow.is_empty() || !fixed.is_empty();
    if !flow.is_empty() {
        slide.add_text_box(layout::auto_text_box(config).to_geometry(), flow, autofit)?;
    }
    for (rect, spec) in fixed {
        slide.add_text_box(rect.to_geometry(), vec![spec], autofit)?;
    }
    Ok(placed)
}
