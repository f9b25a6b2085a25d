//! Presentation writer components for PPTX.

pub mod pres;
pub mod shape;
pub mod slide;

// Re-export main types
pub use pres::MutablePresentation;
pub use shape::{MutableShape, ParagraphSpec};
pub use slide::{BuiltSlide, MutableSlide, SLIDES_BASE_URI, SlideMedia};
