//! Slide composition engine.
//!
//! Rows of a worksheet become slides of a presentation. The pieces, in the
//! order a run uses them:
//!
//! - [`source`] reads the bound worksheet into [`RowRecord`]s
//! - [`resolver`] finds each row's image in the workbook or on disk
//! - [`introspect`] indexes the template slide's shapes
//! - [`mapper`] assigns text columns to template paragraphs
//! - [`layout`] computes image and text geometry
//! - [`composer`] builds one slide per row
//! - [`generate`] runs the above and assembles the package
//!
//! # Example
//!
//! ```rust,no_run
//! use rowdeck::deck::{SlideLayoutConfig, run_files};
//!
//! let config = SlideLayoutConfig::from_yaml_str("image_column: Photo\ntext_columns: [Name, Price]\n")?;
//! let report = run_files("products.xlsx", None, "products.pptx", &config)?;
//! println!("{}", report);
//! # Ok::<(), rowdeck::common::Error>(())
//! ```

pub mod composer;
pub mod config;
pub mod generate;
pub mod introspect;
pub mod layout;
pub mod mapper;
pub mod report;
pub mod resolver;
pub mod row;
pub mod source;

pub use composer::{ComposedSlide, SlideComposer};
pub use config::{
    ColumnFormat, ColumnPosition, ElementMode, GenerationMode, HorizontalAlign, ImageAlignment, ImageElement,
    Orientation, Overflow, PositionMode, SizingMode, SlideLayoutConfig, TemplateMode, TextGroup, VerticalAlign,
};
pub use generate::{Generation, generate, run_files, run_workbook};
pub use introspect::{ParagraphMetadata, ShapeKind, ShapeMetadata, TemplateIndex};
pub use layout::Rect;
pub use mapper::{SlotAssignment, SlotFill};
pub use report::{GenerationReport, RowWarning, SlideReport};
pub use resolver::{ImageAssetResolver, ImageLimits};
pub use row::{ColumnContentMap, ImageLookup, ImageSource, ResolvedImage, RowRecord};
pub use source::RowSource;
