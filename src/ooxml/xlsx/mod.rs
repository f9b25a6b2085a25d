//! Excel workbook (`.xlsx`) reading.
//!
//! A narrow reader: cell text for tabulation plus the two indirections that
//! lead from a cell to a picture (drawing anchors and rich-data values).

pub mod cell;
pub mod drawing;
pub mod rich_data;
pub mod shared_strings;
pub mod workbook;
pub mod worksheet;

pub use cell::{Cell, CellRef, CellValue};
pub use drawing::DrawingImageIndex;
pub use rich_data::RichDataImageIndex;
pub use shared_strings::SharedStrings;
pub use workbook::Workbook;
pub use worksheet::Worksheet;
