//! Workbook access for the deck pipeline.
//!
//! Opens an `.xlsx` package, picks a worksheet (by name, else the active tab,
//! else the first sheet) and builds everything row processing needs up
//! front: the parsed sheet, shared strings and both image indices. All of it
//! is read-only afterwards, so a `Workbook` can be shared across threads.

use crate::common::xml::attr_value;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::relationship_type as RT;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::xlsx::cell::{CellRef, CellValue, format_number};
use crate::ooxml::xlsx::drawing::DrawingImageIndex;
use crate::ooxml::xlsx::rich_data::RichDataImageIndex;
use crate::ooxml::xlsx::shared_strings::SharedStrings;
use crate::ooxml::xlsx::worksheet::Worksheet;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::Path;
use tracing::debug;

const DEFAULT_WORKBOOK_PART: &str = "/xl/workbook.xml";
const DEFAULT_SHEET_PART: &str = "/xl/worksheets/sheet1.xml";
const DEFAULT_SHARED_STRINGS_PART: &str = "/xl/sharedStrings.xml";

/// Sheet entry from `xl/workbook.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInfo {
    pub name: String,
    pub r_id: String,
}

/// An opened workbook bound to one worksheet.
#[derive(Debug)]
pub struct Workbook {
    package: OpcPackage,
    sheet_name: String,
    sheet_partname: PackURI,
    worksheet: Worksheet,
    shared_strings: SharedStrings,
    drawing_images: DrawingImageIndex,
    rich_data_images: RichDataImageIndex,
}

impl Workbook {
    /// Open a workbook file.
    ///
    /// # Arguments
    /// * `path` - Path to the `.xlsx` file
    /// * `sheet` - Worksheet name; `None` selects the active sheet
    pub fn open<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Self> {
        Self::from_package(OpcPackage::open(path)?, sheet)
    }

    /// Open a workbook from bytes.
    pub fn from_bytes(data: Vec<u8>, sheet: Option<&str>) -> Result<Self> {
        Self::from_package(OpcPackage::from_bytes(data)?, sheet)
    }

    fn from_package(package: OpcPackage, sheet: Option<&str>) -> Result<Self> {
        let workbook_part = package
            .main_document_partname()
            .unwrap_or_else(|_| PackURI::from_membername(DEFAULT_WORKBOOK_PART));
        let workbook_rels = package.rels_for(&workbook_part)?;

        let (sheets, active_tab) = match package.part(&workbook_part) {
            Some(xml) => parse_workbook(xml)?,
            None => (Vec::new(), 0),
        };

        let chosen = match sheet {
            Some(name) => Some(
                sheets
                    .iter()
                    .find(|s| s.name == name)
                    .or_else(|| sheets.iter().find(|s| s.name.eq_ignore_ascii_case(name)))
                    .ok_or_else(|| OoxmlError::PartNotFound(format!("worksheet '{}'", name)))?,
            ),
            None => sheets.get(active_tab).or_else(|| sheets.first()),
        };

        let (sheet_name, sheet_partname) = match chosen {
            Some(info) => (info.name.clone(), workbook_rels.target_partname(&info.r_id)?),
            None => (
                "Sheet1".to_string(),
                PackURI::from_membername(DEFAULT_SHEET_PART),
            ),
        };

        let worksheet = Worksheet::parse(
            package
                .part(&sheet_partname)
                .ok_or_else(|| OoxmlError::PartNotFound(sheet_partname.to_string()))?,
        )?;

        let shared_strings_part = workbook_rels
            .first_of_type(RT::SHARED_STRINGS)
            .and_then(|rel| rel.target_partname().ok())
            .unwrap_or_else(|| PackURI::from_membername(DEFAULT_SHARED_STRINGS_PART));
        let shared_strings = match package.part(&shared_strings_part) {
            Some(xml) => SharedStrings::parse(xml)?,
            None => SharedStrings::new(),
        };

        let drawing_images = DrawingImageIndex::build(&package, &sheet_partname, &worksheet)?;
        let rich_data_images = RichDataImageIndex::build(&package)?;

        debug!(
            sheet = %sheet_name,
            part = %sheet_partname,
            shared_strings = shared_strings.len(),
            "opened workbook"
        );

        Ok(Self {
            package,
            sheet_name,
            sheet_partname,
            worksheet,
            shared_strings,
            drawing_images,
            rich_data_images,
        })
    }

    /// Name of the bound worksheet.
    #[inline]
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    #[inline]
    pub fn sheet_partname(&self) -> &PackURI {
        &self.sheet_partname
    }

    #[inline]
    pub fn worksheet(&self) -> &Worksheet {
        &self.worksheet
    }

    #[inline]
    pub fn drawing_images(&self) -> &DrawingImageIndex {
        &self.drawing_images
    }

    #[inline]
    pub fn rich_data_images(&self) -> &RichDataImageIndex {
        &self.rich_data_images
    }

    /// Bytes of a media part.
    #[inline]
    pub fn media(&self, partname: &PackURI) -> Option<&[u8]> {
        self.package.part(partname)
    }

    /// Display text of a cell; empty for missing cells.
    pub fn cell_text(&self, cell: CellRef) -> String {
        let Some(cell) = self.worksheet.cell(cell) else {
            return String::new();
        };
        match &cell.value {
            CellValue::Empty => String::new(),
            CellValue::SharedString(i) => self.shared_strings.get(*i).unwrap_or_default().to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => format_number(*n),
            CellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            // Rich-data image cells carry #VALUE! as their cached value
            CellValue::Error(_) if cell.value_metadata.is_some() => String::new(),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// `vm` attribute of a cell.
    #[inline]
    pub fn value_metadata(&self, cell: CellRef) -> Option<u32> {
        self.worksheet.cell(cell).and_then(|c| c.value_metadata)
    }

    /// Last row with either a cell or an anchored picture.
    pub fn last_row(&self) -> Option<u32> {
        match (self.worksheet.last_row(), self.drawing_images.last_row()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Parse `xl/workbook.xml`: sheet list in tab order, and the active tab.
pub fn parse_workbook(xml: &[u8]) -> Result<(Vec<SheetInfo>, usize)> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut sheets = Vec::new();
    let mut active_tab = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"workbookView" => {
                    active_tab = attr_value(e, b"activeTab")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                },
                b"sheet" => {
                    if let (Some(name), Some(r_id)) = (attr_value(e, b"name"), attr_value(e, b"id")) {
                        sheets.push(SheetInfo { name, r_id });
                    }
                },
                _ => {},
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    Ok((sheets, active_tab))
}
