/// Open Packaging Conventions (OPC) support.
///
/// The ZIP container, partnames, relationships and content types shared by
/// `.xlsx` inputs and `.pptx` templates/outputs.
///
/// - Uses `quick-xml` for relationship and content type parsing
/// - Uses `zip` for the physical container
/// - Uses `atoi_simd` for rId arithmetic
pub mod constants;
pub mod content_types;
pub mod error;
pub mod package;
pub mod packuri;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use content_types::ContentTypeMap;
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
