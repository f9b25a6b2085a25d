//! PowerPoint (.pptx) presentation support.
//!
//! Reading side: [`Package`] gives the slide list, slide size and layouts of
//! a presentation or template; [`Slide`] holds one slide's markup with its
//! shape tree split into top-level shapes.
//!
//! Writing side: [`MutableSlide`] clones a template slide (or starts an
//! empty one) and splices shapes in; [`MutablePresentation`] collects
//! finished slides into the package and serializes it.
//!
//! ```rust,no_run
//! use rowdeck::ooxml::pptx::{MutablePresentation, MutableSlide, Package};
//!
//! let pkg = Package::open("template.pptx")?;
//! let template = pkg.first_slide()?.expect("template has a slide");
//! let mut pres = MutablePresentation::new(pkg)?;
//! for _ in 0..3 {
//!     pres.add_slide(MutableSlide::from_template(&template).finish())?;
//! }
//! std::fs::write("out.pptx", pres.save_to_bytes()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod format;
pub mod package;
pub mod shapes;
pub mod slide;
pub mod template;
pub mod writer;

pub use format::{Autofit, ImageFormat, TextAlign, TextFormat};
pub use package::Package;
pub use shapes::{BaseShape, Paragraph, ShapeGeometry, ShapeTree, ShapeType, TextFrame};
pub use slide::Slide;
pub use writer::{BuiltSlide, MutablePresentation, MutableShape, MutableSlide, ParagraphSpec, SlideMedia};
