//! Office Open XML (OOXML) package access.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): in-memory packages, pack URIs, relationships
//!    and content types
//! 2. **Format-Specific Modules**:
//!    - `xlsx`: the worksheet, shared strings and the two places a workbook
//!      keeps cell images (drawing anchors and rich-data values)
//!    - `pptx`: template slides, shape trees, and writing slides back into
//!      a presentation
//!
//! # Example: Listing the images of a worksheet
//!
//! ```rust,no_run
//! use rowdeck::ooxml::xlsx::Workbook;
//!
//! let wb = Workbook::open("products.xlsx", None)?;
//! for (cell, media) in wb.drawing_images().iter() {
//!     println!("{} -> {}", cell, media);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;
pub mod xlsx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
