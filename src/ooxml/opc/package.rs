/// In-memory OPC package.
///
/// OpcPackage keeps every part as raw bytes keyed by partname, together with
/// the parsed content type map. Workbooks are only read from it; templates are
/// read, edited (slides removed and added) and written back out.
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::content_types::{ContentTypeMap, base_content_types};
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::{PhysPkgReader, PhysPkgWriter};
use crate::ooxml::opc::rel::Relationships;
use std::collections::BTreeMap;
use std::path::Path;

/// Main API type for working with OPC packages.
#[derive(Debug, Clone, Default)]
pub struct OpcPackage {
    /// Content types, parsed from `[Content_Types].xml`
    content_types: ContentTypeMap,

    /// All other parts (including `.rels` parts), indexed by partname
    parts: BTreeMap<String, Vec<u8>>,
}

impl OpcPackage {
    /// Create a new empty package with the base `rels`/`xml` defaults.
    pub fn new() -> Self {
        Self {
            content_types: base_content_types(),
            parts: BTreeMap::new(),
        }
    }

    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use rowdeck::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("products.xlsx").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let phys_reader = PhysPkgReader::open(path)?;
        Self::from_phys_reader(phys_reader)
    }

    /// Load an OPC package from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_phys_reader(PhysPkgReader::from_bytes(data)?)
    }

    fn from_phys_reader(mut phys_reader: PhysPkgReader) -> Result<Self> {
        let mut parts = phys_reader.read_all()?;
        let content_types = match parts.remove(CONTENT_TYPES_URI) {
            Some(xml) => ContentTypeMap::from_xml(&xml)?,
            None => {
                return Err(OpcError::PartNotFound(CONTENT_TYPES_URI.to_string()));
            },
        };
        Ok(Self {
            content_types,
            parts,
        })
    }

    /// Raw bytes of a part.
    #[inline]
    pub fn part(&self, partname: &PackURI) -> Option<&[u8]> {
        self.parts.get(partname.as_str()).map(Vec::as_slice)
    }

    /// Raw bytes of a part, or `PartNotFound`.
    pub fn require_part(&self, partname: &PackURI) -> Result<&[u8]> {
        self.part(partname)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    #[inline]
    pub fn contains(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname.as_str())
    }

    /// Insert or replace a part and, when given, its content type override.
    pub fn set_part(&mut self, partname: &PackURI, blob: Vec<u8>, content_type: Option<&str>) {
        if let Some(ct) = content_type {
            self.content_types.add_override(partname.as_str(), ct);
        }
        self.parts.insert(partname.as_str().to_string(), blob);
    }

    /// Remove a part together with its `.rels` part and content type override.
    pub fn remove_part(&mut self, partname: &PackURI) -> Option<Vec<u8>> {
        self.content_types.remove_override(partname.as_str());
        self.parts.remove(partname.rels_uri().as_str());
        self.parts.remove(partname.as_str())
    }

    /// Relationships whose source is `source`. Missing `.rels` yields an
    /// empty collection.
    pub fn rels_for(&self, source: &PackURI) -> Result<Relationships> {
        match self.part(&source.rels_uri()) {
            Some(xml) => Relationships::from_xml(source.base_uri(), xml),
            None => Ok(Relationships::new(source.base_uri())),
        }
    }

    /// Package-level relationships (`/_rels/.rels`).
    pub fn package_rels(&self) -> Result<Relationships> {
        let root = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        self.rels_for(&root)
    }

    /// Replace the relationships of `source`.
    pub fn set_rels(&mut self, source: &PackURI, rels: &Relationships) {
        self.parts
            .insert(source.rels_uri().as_str().to_string(), rels.to_xml().into_bytes());
    }

    /// Partname of the main document (the package `officeDocument` target).
    pub fn main_document_partname(&self) -> Result<PackURI> {
        let rels = self.package_rels()?;
        rels.first_of_type(relationship_type::OFFICE_DOCUMENT)
            .ok_or_else(|| {
                OpcError::RelationshipNotFound("officeDocument relationship".to_string())
            })?
            .target_partname()
    }

    #[inline]
    pub fn content_types(&self) -> &ContentTypeMap {
        &self.content_types
    }

    #[inline]
    pub fn content_types_mut(&mut self) -> &mut ContentTypeMap {
        &mut self.content_types
    }

    /// Iterate over partnames in lexical order.
    pub fn partnames(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();
        writer.write_content_types(self.content_types.to_xml().as_bytes())?;
        for (partname, blob) in &self.parts {
            let uri = PackURI::new(partname.as_str()).map_err(OpcError::InvalidPackUri)?;
            writer.write(&uri, blob)?;
        }
        writer.finish()
    }
}
