/// Shapes module for PowerPoint slides.
///
/// Read-side view of a slide's shape tree:
/// - `base`: top-level shapes with name, id and geometry
/// - `textframe`: paragraphs of a shape's text body, and rewriting them
pub mod base;
pub mod textframe;

pub use base::{BaseShape, ShapeGeometry, ShapeTree, ShapeType};
pub use textframe::{Paragraph, TextFrame};
