//! Styling primitives shared by the template reader and the slide writer.

pub mod color;

pub use color::RGBColor;
