//! Row records: the per-slide input of the composer.

use crate::ooxml::pptx::ImageFormat;
use std::fmt;

/// Where a resolved image was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Picture anchored to the cell through the worksheet drawing
    Drawing,
    /// Picture pasted into the cell (rich value)
    RichData,
    /// Cell text naming a file on disk
    LocalPath,
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drawing => "drawing",
            Self::RichData => "rich data",
            Self::LocalPath => "local path",
        })
    }
}

/// Image bytes that decoded successfully, with their pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
    pub source: ImageSource,
    /// Cell reference or file name, used as the picture description
    pub label: String,
}

impl ResolvedImage {
    /// Width over height; 1.0 for a zero-height image.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height_px == 0 {
            1.0
        } else {
            self.width_px as f64 / self.height_px as f64
        }
    }
}

/// Outcome of resolving one image cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ImageLookup {
    Found(ResolvedImage),
    /// Nothing in the cell
    #[default]
    Empty,
    /// Something was there but could not be used
    Failed(String),
}

impl ImageLookup {
    pub fn image(&self) -> Option<&ResolvedImage> {
        match self {
            Self::Found(image) => Some(image),
            _ => None,
        }
    }
}

/// Column identifier → text, in the order the columns were declared.
///
/// Empty cells are kept as empty strings so positions stay stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnContentMap {
    entries: Vec<(String, String)>,
}

impl ColumnContentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text of a column. A column inserted twice keeps its first
    /// position and takes the new text.
    pub fn insert(&mut self, column: impl Into<String>, text: impl Into<String>) {
        let column = column.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((column, text)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, t)| (c.as_str(), t.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries of `columns`, in that order. Columns not present are
    /// skipped.
    pub fn select(&self, columns: &[String]) -> ColumnContentMap {
        let mut selected = ColumnContentMap::new();
        for column in columns {
            if let Some(text) = self.get(column) {
                selected.insert(column.clone(), text);
            }
        }
        selected
    }
}

impl<C: Into<String>, T: Into<String>> FromIterator<(C, T)> for ColumnContentMap {
    fn from_iter<I: IntoIterator<Item = (C, T)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (column, text) in iter {
            map.insert(column, text);
        }
        map
    }
}

/// One data row: everything needed to compose its slide.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    /// Zero-based position among the data rows
    pub row_index: usize,
    /// One-based worksheet row
    pub sheet_row: u32,
    pub texts: ColumnContentMap,
    /// Image column → lookup outcome
    pub images: Vec<(String, ImageLookup)>,
}

impl RowRecord {
    pub fn new(row_index: usize, sheet_row: u32, texts: ColumnContentMap) -> Self {
        Self {
            row_index,
            sheet_row,
            texts,
            images: Vec::new(),
        }
    }

    /// Lookup outcome of an image column; `Empty` when the column was not
    /// resolved.
    pub fn image(&self, column: &str) -> &ImageLookup {
        static EMPTY: ImageLookup = ImageLookup::Empty;
        self.images
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, lookup)| lookup)
            .unwrap_or(&EMPTY)
    }

    pub fn set_image(&mut self, column: impl Into<String>, lookup: ImageLookup) {
        let column = column.into();
        match self.images.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = lookup,
            None => self.images.push((column, lookup)),
        }
    }
}
