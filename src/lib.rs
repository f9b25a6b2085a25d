//! Rowdeck - turn spreadsheet rows into PowerPoint slides
//!
//! Every data row of an `.xlsx` worksheet becomes one slide of a `.pptx`
//! presentation: an image from the row plus the row's text columns, laid out
//! either on an empty slide or into the named shapes of a template slide.
//!
//! # Features
//!
//! - **Image sources**: pictures anchored to a cell, pictures pasted into a
//!   cell (rich values), and file paths written in a cell
//! - **Template slides**: the template's first slide is cloned per row; text
//!   columns fill its paragraphs in order, skipping paragraphs the template
//!   leaves empty
//! - **Layout**: four image sizing modes, alignment on both axes, flowing or
//!   fixed text placement, grow or shrink text overflow
//! - **Skip and continue**: a bad row still yields a slide; problems are
//!   collected in a [`GenerationReport`]
//!
//! # Example - Blank slides
//!
//! ```no_run
//! use rowdeck::{SlideLayoutConfig, Workbook, run_workbook};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SlideLayoutConfig {
//!     image_column: "Photo".into(),
//!     text_columns: vec!["Name".into(), "Price".into()],
//!     ..Default::default()
//! };
//! let workbook = Workbook::open("products.xlsx", None)?;
//! let generation = run_workbook(&workbook, &config, None)?;
//! generation.save("products.pptx")?;
//! println!("{}", generation.report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Filling a template
//!
//! ```no_run
//! use rowdeck::{SlideLayoutConfig, Workbook, run_workbook};
//! use rowdeck::ooxml::pptx::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SlideLayoutConfig::from_yaml_str(
//!     r#"
//! template_mode: template
//! image_column: Photo
//! image_placeholder: Picture Placeholder
//! text_columns: [Brand, Description]
//! text_placeholder: TextBox
//! "#,
//! )?;
//! let template = Package::open("brand.pptx")?;
//! let workbook = Workbook::open("brands.xlsx", None)?;
//! let generation = run_workbook(&workbook, &config, Some(template))?;
//! for (row, warning) in generation.report.warnings() {
//!     eprintln!("{:?}: {}", row, warning);
//! }
//! # Ok(())
//! # }
//! ```

/// Error type, unit conversions and XML helpers shared by all layers
pub mod common;

/// The composition engine: configuration, row records, image resolution,
/// template introspection, column mapping, layout and slide composition
pub mod deck;

/// OOXML package access
///
/// Reading `.xlsx` workbooks and `.pptx` templates, and writing the
/// generated presentation.
pub mod ooxml;

#[cfg(test)]
mod test_support;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use deck::{
    Generation, GenerationReport, RowRecord, RowWarning, SlideLayoutConfig, generate, run_files, run_workbook,
};
pub use ooxml::xlsx::Workbook;
