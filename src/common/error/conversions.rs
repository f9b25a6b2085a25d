//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from internal
//! error types to the unified Error type.

use super::types::Error;
use crate::ooxml::error::OoxmlError;
use crate::ooxml::opc::error::OpcError;

impl From<OpcError> for Error {
    fn from(err: OpcError) -> Self {
        Error::from_opc_error(err)
    }
}

impl From<OoxmlError> for Error {
    fn from(err: OoxmlError) -> Self {
        match err {
            OoxmlError::Io(e) => Error::Io(e),
            OoxmlError::Xml(s) => Error::XmlError(s),
            OoxmlError::PartNotFound(s) => Error::ComponentNotFound(s),
            OoxmlError::InvalidContentType { expected, got } => {
                Error::InvalidContentType { expected, got }
            },
            OoxmlError::InvalidRelationship(s) => Error::CorruptedFile(s),
            OoxmlError::InvalidFormat(s) => Error::InvalidFormat(s),
            OoxmlError::Opc(e) => Error::from_opc_error(e),
            OoxmlError::Other(s) => Error::Other(s),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::ZipError(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl Error {
    fn from_opc_error(err: OpcError) -> Self {
        match err {
            OpcError::PackageNotFound(s) => {
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, s))
            },
            OpcError::PartNotFound(s) => Error::ComponentNotFound(s),
            OpcError::RelationshipNotFound(s) => Error::ComponentNotFound(s),
            OpcError::InvalidPackUri(s) | OpcError::InvalidRelationship(s) => {
                Error::CorruptedFile(s)
            },
            OpcError::XmlError(s) | OpcError::AttrError(s) => Error::XmlError(s),
            OpcError::ZipError(e) => Error::ZipError(e.to_string()),
            OpcError::IoError(e) => Error::Io(e),
            OpcError::QuickXmlError(e) => Error::XmlError(e.to_string()),
            OpcError::Utf8Error(e) => Error::InvalidFormat(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_not_found_maps_to_component() {
        let err: Error = OpcError::PartNotFound("/ppt/slides/slide1.xml".to_string()).into();
        assert!(matches!(err, Error::ComponentNotFound(ref s) if s.contains("slide1")));
    }

    #[test]
    fn test_ooxml_nested_opc_error() {
        let err: Error = OoxmlError::Opc(OpcError::XmlError("bad".to_string())).into();
        assert!(matches!(err, Error::XmlError(_)));
    }
}
