//! Physical access to an OPC package stored as a ZIP archive.
//!
//! Reading decompresses every member up front into memory; workbooks and
//! templates are small next to the images they carry, and the in-memory form
//! can be shared across worker threads without locking. Writing emits
//! `[Content_Types].xml` as the first member, as Office expects.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Physical package reader over an owned ZIP buffer.
pub struct PhysPkgReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl PhysPkgReader {
    /// Open an OPC package from a file path.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, isn't a valid ZIP file,
    /// or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }

        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Create a reader from owned bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Get the binary content for a part by its PackURI.
    pub fn blob_for(&mut self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(pack_uri.membername())
            .map_err(|_| OpcError::PartNotFound(pack_uri.to_string()))?;
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Number of members in the archive, directories included.
    #[inline]
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// Decompress every file member, keyed by partname ("/ppt/slides/slide1.xml").
    pub fn read_all(&mut self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut parts = BTreeMap::new();
        for i in 0..self.archive.len() {
            let mut file = self.archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let partname = PackURI::from_membername(file.name());
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.insert(partname.as_str().to_string(), content);
        }
        Ok(parts)
    }
}

/// Physical package writer producing an in-memory ZIP archive.
pub struct PhysPkgWriter {
    zip_writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        Self {
            zip_writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write one part.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        // Media is already compressed; deflating it again only costs time.
        let method = match pack_uri.ext().to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" => zip::CompressionMethod::Stored,
            _ => zip::CompressionMethod::Deflated,
        };
        let options = SimpleFileOptions::default().compression_method(method);
        self.zip_writer
            .start_file(pack_uri.membername(), options)?;
        self.zip_writer.write_all(blob)?;
        Ok(())
    }

    /// Write `[Content_Types].xml`. Call before any other part.
    pub fn write_content_types(&mut self, xml: &[u8]) -> Result<()> {
        let uri = PackURI::new(CONTENT_TYPES_URI).map_err(OpcError::InvalidPackUri)?;
        self.write(&uri, xml)
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self.zip_writer.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let mut writer = PhysPkgWriter::new();
        writer.write_content_types(b"<Types/>").unwrap();
        writer
            .write(&PackURI::new("/ppt/slides/slide1.xml").unwrap(), b"<p:sld/>")
            .unwrap();
        writer
            .write(&PackURI::new("/ppt/media/image1.png").unwrap(), &[0x89, b'P', b'N', b'G'])
            .unwrap();
        let bytes = writer.finish().unwrap();

        let mut reader = PhysPkgReader::from_bytes(bytes).unwrap();
        assert_eq!(reader.len(), 3);
        let slide = reader
            .blob_for(&PackURI::new("/ppt/slides/slide1.xml").unwrap())
            .unwrap();
        assert_eq!(slide, b"<p:sld/>");
        assert!(matches!(
            reader.blob_for(&PackURI::new("/missing.xml").unwrap()),
            Err(OpcError::PartNotFound(_))
        ));

        let all = reader.read_all().unwrap();
        assert!(all.contains_key("/[Content_Types].xml"));
        assert_eq!(all["/ppt/media/image1.png"].len(), 4);
    }

    #[test]
    fn test_rejects_non_zip() {
        assert!(PhysPkgReader::from_bytes(b"not a zip".to_vec()).is_err());
        assert!(matches!(
            PhysPkgReader::open("/definitely/not/here.pptx"),
            Err(OpcError::PackageNotFound(_))
        ));
    }
}
