//! Unified error type for rowdeck.
//!
//! Package, workbook and template errors all surface through [`Error`], which
//! is what every fatal, input-level failure of a generation run looks like to
//! callers. Row-level problems never become an `Error`; they are recorded as
//! warnings in the generation report instead.
use thiserror::Error;

/// Main error type for rowdeck operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Corrupted or malformed file
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    /// Package part not found
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// Invalid content type
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Template presentation does not contain any slide
    #[error("Template has no slides")]
    TemplateHasNoSlides,

    /// The workbook does not expose a usable worksheet
    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),

    /// A configured column does not exist in the header row
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Nothing to generate
    #[error("No rows to generate slides from")]
    NoRows,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for rowdeck operations.
pub type Result<T> = std::result::Result<T, Error>;
