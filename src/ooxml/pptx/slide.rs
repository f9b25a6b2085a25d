/// A slide read from a presentation package.
use crate::ooxml::error::Result;
use crate::ooxml::opc::constants::relationship_type as RT;
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::{OpcPackage, Relationships};
use crate::ooxml::pptx::shapes::{BaseShape, ShapeTree};

/// A slide in a presentation, with its markup, relationships and shape
/// tree.
///
/// Used as the pattern every generated slide is cloned from. The notes
/// relationship is dropped on load, since notes pages are not carried into
/// generated slides.
#[derive(Debug, Clone)]
pub struct Slide {
    partname: PackURI,
    xml: Vec<u8>,
    rels: Relationships,
    tree: ShapeTree,
}

impl Slide {
    /// Load a slide part from the package.
    pub fn load(package: &OpcPackage, partname: &PackURI) -> Result<Self> {
        let xml = package.require_part(partname)?.to_vec();
        let mut rels = package.rels_for(partname)?;
        rels.retain(|rel| rel.reltype() != RT::NOTES_SLIDE);
        Self::from_parts(partname.clone(), xml, rels)
    }

    /// Build from already-loaded markup and relationships.
    pub fn from_parts(partname: PackURI, xml: Vec<u8>, rels: Relationships) -> Result<Self> {
        let tree = ShapeTree::parse(&xml)?;
        Ok(Self {
            partname,
            xml,
            rels,
            tree,
        })
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    #[inline]
    pub fn xml(&self) -> &[u8] {
        &self.xml
    }

    #[inline]
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    #[inline]
    pub fn shape_tree(&self) -> &ShapeTree {
        &self.tree
    }

    /// Top-level shapes in document order.
    #[inline]
    pub fn shapes(&self) -> &[BaseShape] {
        self.tree.shapes()
    }
}
