//! Unified error types for rowdeck.
//!
//! Layer-specific errors (OPC packaging, OOXML parts) convert into the single
//! [`Error`] type exposed at the crate root.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
