//! Per-row warnings and the run report.

use std::fmt;
use thiserror::Error;

/// A non-fatal problem found while composing a slide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowWarning {
    /// The image cell was empty
    #[error("no image in column '{column}'")]
    ImageMissing { column: String },
    /// The image cell had content that could not be used
    #[error("image in column '{column}' could not be used: {reason}")]
    ImageUnresolved { column: String, reason: String },
    /// More columns than content slots; the extra columns were not placed
    #[error("shape '{shape}' has no slot for column(s) {}", quoted_list(.dropped))]
    ExcessColumns { shape: String, dropped: Vec<String> },
    /// No template shape carries this name
    #[error("template has no shape named '{name}'")]
    PlaceholderNotFound { name: String },
    /// The configured mode is not supported; `fallback` was used instead
    #[error("mode '{mode}' is not supported, composed as '{fallback}'")]
    UnsupportedMode { mode: String, fallback: String },
}

fn quoted_list(items: &[String]) -> String {
    items.iter().map(|c| format!("'{}'", c)).collect::<Vec<_>>().join(", ")
}

/// Outcome of one composed slide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideReport {
    /// Zero-based data row
    pub row_index: usize,
    /// One-based worksheet row, when the row came from a worksheet
    pub sheet_row: u32,
    /// At least one picture was placed
    pub has_image: bool,
    /// At least one text container was filled
    pub text_added: bool,
    pub warnings: Vec<RowWarning>,
}

impl SlideReport {
    pub fn new(row_index: usize, sheet_row: u32) -> Self {
        Self {
            row_index,
            sheet_row,
            ..Default::default()
        }
    }

    #[inline]
    pub fn warn(&mut self, warning: RowWarning) {
        self.warnings.push(warning);
    }

    #[inline]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub rows_processed: usize,
    pub slides_with_images: usize,
    pub rows_with_warnings: usize,
    /// One entry per slide, in output order
    pub slides: Vec<SlideReport>,
    /// Warnings about the run as a whole
    pub run_warnings: Vec<RowWarning>,
}

impl GenerationReport {
    pub fn from_slides(slides: Vec<SlideReport>, run_warnings: Vec<RowWarning>) -> Self {
        Self {
            rows_processed: slides.len(),
            slides_with_images: slides.iter().filter(|s| s.has_image).count(),
            rows_with_warnings: slides.iter().filter(|s| s.has_warnings()).count(),
            slides,
            run_warnings,
        }
    }

    /// One-line summary, e.g. `12 rows processed, 10 slides with images, 2
    /// rows with warnings`.
    pub fn summary(&self) -> String {
        format!(
            "{} rows processed, {} slides with images, {} rows with warnings",
            self.rows_processed, self.slides_with_images, self.rows_with_warnings
        )
    }

    /// Every warning with the row it belongs to; run warnings have no row.
    pub fn warnings(&self) -> impl Iterator<Item = (Option<usize>, &RowWarning)> {
        self.run_warnings.iter().map(|w| (None, w)).chain(
            self.slides
                .iter()
                .flat_map(|s| s.warnings.iter().map(move |w| (Some(s.row_index), w))),
        )
    }
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for (row, warning) in self.warnings() {
            match row {
                Some(row) => writeln!(f, "  row {}: {}", row + 1, warning)?,
                None => writeln!(f, "  {}", warning)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        let w = RowWarning::ExcessColumns {
            shape: "TextBox 2".into(),
            dropped: vec!["Notes".into(), "Extra".into()],
        };
        assert_eq!(w.to_string(), "shape 'TextBox 2' has no slot for column(s) 'Notes', 'Extra'");
        let w = RowWarning::ImageUnresolved {
            column: "Photo".into(),
            reason: "image file not found: a.png".into(),
        };
        assert_eq!(
            w.to_string(),
            "image in column 'Photo' could not be used: image file not found: a.png"
        );
        let w = RowWarning::PlaceholderNotFound { name: "Badge".into() };
        assert_eq!(w.to_string(), "template has no shape named 'Badge'");
        let err: &dyn std::error::Error = &w;
        assert!(err.source().is_none());
    }

    #[test]
    fn test_summary_counts() {
        let mut a = SlideReport::new(0, 2);
        a.has_image = true;
        a.text_added = true;
        let mut b = SlideReport::new(1, 3);
        b.warn(RowWarning::ImageMissing { column: "Photo".into() });
        let report = GenerationReport::from_slides(
            vec![a, b],
            vec![RowWarning::UnsupportedMode {
                mode: "blank/multi".into(),
                fallback: "blank/single".into(),
            }],
        );

        assert_eq!(report.rows_processed, 2);
        assert_eq!(report.slides_with_images, 1);
        assert_eq!(report.rows_with_warnings, 1);
        assert_eq!(report.summary(), "2 rows processed, 1 slides with images, 1 rows with warnings");

        let rendered = report.to_string();
        assert!(rendered.contains("  row 2: no image in column 'Photo'"));
        assert!(rendered.contains("composed as 'blank/single'"));
        assert_eq!(report.warnings().count(), 2);
    }
}
