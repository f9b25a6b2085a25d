//! A generation run: rows in, presentation bytes and a report out.

use crate::common::{Error, Result};
use crate::deck::composer::{ComposedSlide, SlideComposer};
use crate::deck::config::SlideLayoutConfig;
use crate::deck::introspect::TemplateIndex;
use crate::deck::report::GenerationReport;
use crate::deck::resolver::ImageAssetResolver;
use crate::deck::row::RowRecord;
use crate::deck::source::RowSource;
use crate::ooxml::pptx::{MutablePresentation, Package};
use crate::ooxml::xlsx::Workbook;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Output of a run.
#[derive(Debug, Clone)]
pub struct Generation {
    /// The `.pptx` package
    pub pptx: Vec<u8>,
    pub report: GenerationReport,
}

impl Generation {
    /// Write the presentation to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.pptx)?;
        Ok(())
    }
}

/// Compose one slide per row into a presentation.
///
/// With a template, its package is the base of the output: masters,
/// layouts, theme and media are kept and its slides are replaced by the
/// generated ones. Template modes clone its first slide for every row.
/// Without a template, a built-in blank presentation sized by the
/// configured orientation is used.
///
/// Slides come out in row order. Row problems end up in the report; the
/// run fails only on unusable input (no rows, a template without slides,
/// template mode without a template).
pub fn generate(rows: &[RowRecord], config: &SlideLayoutConfig, template: Option<Package>) -> Result<Generation> {
    if rows.is_empty() {
        return Err(Error::NoRows);
    }
    let mode = config.generation_mode(template.is_some())?;

    let package = match template {
        Some(package) => package,
        None => {
            let (cx, cy) = config.slide_size_emu();
            Package::blank(cx, cy)?
        },
    };

    let template_slide = if mode.uses_template() {
        let slide = package.first_slide()?.ok_or(Error::TemplateHasNoSlides)?;
        let index = TemplateIndex::introspect(&slide)?;
        Some((slide, index))
    } else {
        None
    };

    let mut presentation = MutablePresentation::new(package)?;
    let layout_target = presentation.blank_layout_target()?;
    let (composer, run_warnings) = SlideComposer::for_mode(
        mode,
        config,
        layout_target,
        template_slide.as_ref().map(|(slide, index)| (slide, index)),
    )?;
    for warning in &run_warnings {
        warn!(%warning, "generation mode");
    }
    info!(?mode, rows = rows.len(), parallel = config.parallel_rows, "composing slides");

    let composed: Vec<ComposedSlide> = if config.parallel_rows {
        rows.par_iter().map(|row| composer.compose(row)).collect::<Result<_>>()?
    } else {
        rows.iter().map(|row| composer.compose(row)).collect::<Result<_>>()?
    };

    let mut reports = Vec::with_capacity(composed.len());
    for ComposedSlide { slide, report } in composed {
        for warning in &report.warnings {
            warn!(row = report.row_index + 1, sheet_row = report.sheet_row, %warning, "row warning");
        }
        let partname = presentation.add_slide(slide)?;
        debug!(row = report.row_index + 1, slide = %partname, "added slide");
        reports.push(report);
    }

    let pptx = presentation.save_to_bytes()?;
    let report = GenerationReport::from_slides(reports, run_warnings);
    info!(bytes = pptx.len(), "{}", report.summary());
    Ok(Generation { pptx, report })
}

/// Read the rows of a workbook, resolve their images and generate.
pub fn run_workbook(workbook: &Workbook, config: &SlideLayoutConfig, template: Option<Package>) -> Result<Generation> {
    let source = RowSource::new(workbook);
    let mut rows = source.read(config)?;
    if rows.is_empty() {
        return Err(Error::NoRows);
    }

    let resolver = ImageAssetResolver::new(workbook, config)?;
    for column in config.image_columns() {
        let index = source.require_column(&column)?;
        resolver.resolve_rows(&column, index, &mut rows);
    }

    generate(&rows, config, template)
}

/// [`run_workbook`] over files: read `workbook` (and `template`), write the
/// presentation to `output`.
pub fn run_files(
    workbook: impl AsRef<Path>,
    template: Option<&Path>,
    output: impl AsRef<Path>,
    config: &SlideLayoutConfig,
) -> Result<GenerationReport> {
    let workbook = Workbook::open(workbook, config.sheet.as_deref())?;
    let template = template.map(Package::open).transpose()?;
    let generation = run_workbook(&workbook, config, template)?;
    generation.save(output)?;
    Ok(generation.report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::config::{ElementMode, TemplateMode};
    use crate::deck::report::RowWarning;
    use crate::ooxml::opc::OpcPackage;
    use crate::ooxml::opc::constants::relationship_type as RT;
    use crate::ooxml::pptx::{ShapeTree, ShapeType, Slide};
    use crate::test_support::{TEMPLATE_SLIDE, WorkbookFixture, template_pptx, tiny_png};

    fn workbook() -> Workbook {
        let fixture = WorkbookFixture::new(&["Name", "Photo", "Notes"])
            .row(&["Widget", "", "first"])
            .row(&["Gizmo", "/nonexistent/photo.png", "second"])
            .row(&["Doohickey", "", "third"])
            .drawing_image(1, 2, tiny_png(8, 4))
            .rich_image(1, 4, tiny_png(4, 8));
        Workbook::from_bytes(fixture.build(), None).unwrap()
    }

    fn config() -> SlideLayoutConfig {
        SlideLayoutConfig {
            image_column: "Photo".into(),
            text_columns: vec!["Name".into(), "Notes".into()],
            ..Default::default()
        }
    }

    fn slides_of(pptx: Vec<u8>) -> (Package, Vec<Slide>) {
        let package = Package::from_opc(OpcPackage::from_bytes(pptx).unwrap()).unwrap();
        let slides = package
            .slide_partnames()
            .unwrap()
            .iter()
            .map(|pn| Slide::load(package.opc_package(), pn).unwrap())
            .collect();
        (package, slides)
    }

    #[test]
    fn test_one_slide_per_row_and_skip_and_continue() {
        let wb = workbook();
        let generation = run_workbook(&wb, &config(), None).unwrap();

        let report = &generation.report;
        assert_eq!(report.rows_processed, 3);
        assert_eq!(report.slides_with_images, 2);
        assert_eq!(report.rows_with_warnings, 1);
        assert!(matches!(
            &report.slides[1].warnings[..],
            [RowWarning::ImageUnresolved { column, .. }] if column == "Photo"
        ));
        assert!(report.slides[1].text_added);

        let (package, slides) = slides_of(generation.pptx);
        assert_eq!(slides.len(), 3);
        assert_eq!(package.slide_size().unwrap(), (6_858_000, 9_144_000));
        let first = ShapeTree::parse(slides[0].xml()).unwrap();
        assert_eq!(first.shapes()[0].shape_type(), ShapeType::Picture);
        let second = ShapeTree::parse(slides[1].xml()).unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_parallel_rows_keep_order() {
        let wb = workbook();
        let config = SlideLayoutConfig {
            parallel_rows: true,
            ..config()
        };
        let generation = run_workbook(&wb, &config, None).unwrap();
        let rows: Vec<usize> = generation.report.slides.iter().map(|s| s.row_index).collect();
        assert_eq!(rows, vec![0, 1, 2]);

        let (_, slides) = slides_of(generation.pptx);
        let text = String::from_utf8(slides[2].xml().to_vec()).unwrap();
        assert!(text.contains("Doohickey"));
    }

    #[test]
    fn test_template_run_replaces_template_slides() {
        let wb = workbook();
        let config = SlideLayoutConfig {
            template_mode: TemplateMode::Template,
            ..config()
        };
        let template = Package::from_bytes(template_pptx(TEMPLATE_SLIDE)).unwrap();
        let generation = run_workbook(&wb, &config, Some(template)).unwrap();

        let (package, slides) = slides_of(generation.pptx);
        assert_eq!(slides.len(), 3);
        assert_eq!(package.slide_size().unwrap(), (9_144_000, 6_858_000));
        for slide in &slides {
            let names: Vec<&str> = slide.shapes().iter().map(|s| s.name()).collect();
            assert_eq!(names, vec!["Rectangle 1", "TextBox 2", "Logo", "Rectangle 1"]);
            let logo = slide.rels().get("rId2").unwrap().target_partname().unwrap();
            assert!(package.opc_package().contains(&logo));
        }
        let third = String::from_utf8(slides[2].xml().to_vec()).unwrap();
        assert!(third.contains("Doohickey"));
        assert!(third.contains("third"));
        assert!(slides[0].rels().first_of_type(RT::SLIDE_LAYOUT).is_some());
        assert_eq!(generation.report.slides_with_images, 2);
    }

    #[test]
    fn test_fatal_inputs() {
        let config = config();
        assert!(matches!(generate(&[], &config, None), Err(Error::NoRows)));

        let rows = vec![RowRecord::default()];
        let template_mode = SlideLayoutConfig {
            template_mode: TemplateMode::Template,
            ..config.clone()
        };
        assert!(matches!(generate(&rows, &template_mode, None), Err(Error::Config(_))));

        let empty = Package::blank(9_144_000, 6_858_000).unwrap();
        assert!(matches!(
            generate(&rows, &template_mode, Some(empty)),
            Err(Error::TemplateHasNoSlides)
        ));
    }

    #[test]
    fn test_blank_multi_reports_fallback() {
        let rows = vec![RowRecord::default(), RowRecord::default()];
        let config = SlideLayoutConfig {
            element_mode: ElementMode::Multi,
            ..config()
        };
        let generation = generate(&rows, &config, None).unwrap();
        assert_eq!(generation.report.run_warnings.len(), 1);
        assert_eq!(generation.report.rows_processed, 2);
    }

    #[test]
    fn test_run_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("rows.xlsx");
        let output = dir.path().join("deck.pptx");
        std::fs::write(&input, WorkbookFixture::new(&["Name", "Photo"]).row(&["Solo", ""]).build()).unwrap();

        let config = SlideLayoutConfig {
            image_column: "Photo".into(),
            text_columns: vec!["Name".into()],
            ..Default::default()
        };
        let report = run_files(&input, None, &output, &config).unwrap();
        assert_eq!(report.rows_processed, 1);
        assert_eq!(report.slides[0].warnings, vec![RowWarning::ImageMissing { column: "Photo".into() }]);
        assert!(Package::open(&output).is_ok());
    }
}
