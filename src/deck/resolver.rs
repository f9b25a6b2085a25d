//! Image asset resolution.
//!
//! A cell's image is looked for in three places, in order: a picture
//! anchored to the cell by the worksheet drawing, a picture pasted into the
//! cell (rich value, found through the cell's `vm` attribute), and finally
//! the cell text taken as a local file path. The first candidate whose bytes
//! decode as a raster image wins; a candidate that fails falls through to the
//! next one, and its failure is reported only if nothing else succeeds.

use crate::common::{Error, Result};
use crate::deck::config::SlideLayoutConfig;
use crate::deck::row::{ImageLookup, ImageSource, ResolvedImage, RowRecord};
use crate::ooxml::pptx::ImageFormat;
use crate::ooxml::xlsx::Workbook;
use crate::ooxml::xlsx::cell::CellRef;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size and type limits applied to every image.
#[derive(Debug, Clone)]
pub struct ImageLimits {
    pub max_bytes: u64,
    /// Lowercase extensions with the leading dot
    pub allowed_extensions: Vec<String>,
    pub base_path: Option<PathBuf>,
}

impl ImageLimits {
    pub fn from_config(config: &SlideLayoutConfig) -> Self {
        Self {
            max_bytes: config.max_image_bytes(),
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| {
                    let e = e.trim().to_lowercase();
                    if e.starts_with('.') { e } else { format!(".{}", e) }
                })
                .collect(),
            base_path: config.base_path.clone(),
        }
    }

    fn allows_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .is_some_and(|e| self.allowed_extensions.contains(&e))
    }

    fn check_size(&self, len: u64) -> std::result::Result<(), String> {
        if len > self.max_bytes {
            Err(format!(
                "image size ({:.1}MB) exceeds limit ({:.0}MB)",
                len as f64 / BYTES_PER_MB,
                self.max_bytes as f64 / BYTES_PER_MB
            ))
        } else {
            Ok(())
        }
    }
}

/// Resolves image cells of one workbook.
///
/// Cells are resolved on a dedicated, bounded rayon pool. Local files are
/// read at most once per resolver.
pub struct ImageAssetResolver<'a> {
    workbook: &'a Workbook,
    limits: ImageLimits,
    pool: rayon::ThreadPool,
    path_cache: Mutex<HashMap<PathBuf, ImageLookup>>,
}

impl<'a> ImageAssetResolver<'a> {
    pub fn new(workbook: &'a Workbook, config: &SlideLayoutConfig) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.resolver_workers.max(1))
            .thread_name(|i| format!("rowdeck-resolver-{}", i))
            .build()
            .map_err(|e| Error::Other(format!("failed to build resolver thread pool: {}", e)))?;

        Ok(Self {
            workbook,
            limits: ImageLimits::from_config(config),
            pool,
            path_cache: Mutex::new(HashMap::new()),
        })
    }

    #[inline]
    pub fn limits(&self) -> &ImageLimits {
        &self.limits
    }

    /// Resolve one column for a set of worksheet rows. The output is in the
    /// order of `sheet_rows`.
    pub fn resolve(&self, column: u32, sheet_rows: &[u32]) -> Vec<ImageLookup> {
        self.pool.install(|| {
            sheet_rows
                .par_iter()
                .map(|row| self.resolve_cell(CellRef::new(column, *row)))
                .collect()
        })
    }

    /// Resolve an image column for every row and store the outcome under
    /// `column_name`.
    pub fn resolve_rows(&self, column_name: &str, column: u32, rows: &mut [RowRecord]) {
        let sheet_rows: Vec<u32> = rows.iter().map(|r| r.sheet_row).collect();
        let lookups = self.resolve(column, &sheet_rows);

        let found = lookups.iter().filter(|l| matches!(l, ImageLookup::Found(_))).count();
        let failed = lookups.iter().filter(|l| matches!(l, ImageLookup::Failed(_))).count();
        info!(column = column_name, found, failed, rows = rows.len(), "resolved image column");

        for (row, lookup) in rows.iter_mut().zip(lookups) {
            row.set_image(column_name, lookup);
        }
    }

    /// Resolve a single cell.
    pub fn resolve_cell(&self, cell: CellRef) -> ImageLookup {
        let mut failure: Option<String> = None;

        if let Some(media) = self.workbook.drawing_images().get(cell) {
            match self.workbook.media(media) {
                Some(bytes) => match decode(bytes, &self.limits, ImageSource::Drawing, cell.to_string()) {
                    Ok(image) => return ImageLookup::Found(image),
                    Err(reason) => failure = Some(reason),
                },
                None => failure = Some(format!("drawing media {} is missing", media)),
            }
        }

        if let Some(vm) = self.workbook.value_metadata(cell) {
            match self.workbook.rich_data_images().lookup(vm) {
                Some(media) => match self.workbook.media(media) {
                    Some(bytes) => match decode(bytes, &self.limits, ImageSource::RichData, cell.to_string()) {
                        Ok(image) => return ImageLookup::Found(image),
                        Err(reason) => failure = Some(reason),
                    },
                    None => failure = Some(format!("rich data media {} is missing", media)),
                },
                None => failure = Some(format!("no rich data image for value metadata {}", vm)),
            }
        }

        let literal = self.workbook.cell_text(cell);
        let literal = literal.trim();
        let lookup = if literal.is_empty() {
            match failure {
                Some(reason) => ImageLookup::Failed(reason),
                None => ImageLookup::Empty,
            }
        } else if is_remote(literal) {
            ImageLookup::Failed(format!("remote image not fetched: {}", literal))
        } else {
            match (self.resolve_path(literal), failure) {
                (ImageLookup::Failed(_), Some(reason)) => ImageLookup::Failed(reason),
                (lookup, _) => lookup,
            }
        };

        debug!(%cell, outcome = lookup_kind(&lookup), "resolved image cell");
        lookup
    }

    /// Load an image from a local path, relative to the base path when one
    /// is configured.
    pub fn resolve_path(&self, literal: &str) -> ImageLookup {
        let mut path = PathBuf::from(literal);
        if path.is_relative()
            && let Some(base) = &self.limits.base_path
        {
            path = base.join(path);
        }

        if let Some(cached) = self.path_cache.lock().get(&path) {
            return cached.clone();
        }

        let lookup = match load_file(&path, &self.limits) {
            Ok(image) => ImageLookup::Found(image),
            Err(reason) => ImageLookup::Failed(reason),
        };
        self.path_cache.lock().insert(path, lookup.clone());
        lookup
    }

    /// Number of distinct local paths read so far.
    pub fn cached_paths(&self) -> usize {
        self.path_cache.lock().len()
    }
}

fn is_remote(literal: &str) -> bool {
    let lower = literal.get(..8).unwrap_or(literal).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn lookup_kind(lookup: &ImageLookup) -> &'static str {
    match lookup {
        ImageLookup::Found(_) => "found",
        ImageLookup::Empty => "empty",
        ImageLookup::Failed(_) => "failed",
    }
}

fn load_file(path: &Path, limits: &ImageLimits) -> std::result::Result<ResolvedImage, String> {
    if !limits.allows_extension(path) {
        return Err(format!("unsupported image file type: {}", path.display()));
    }
    let metadata = std::fs::metadata(path).map_err(|_| format!("image file not found: {}", path.display()))?;
    if !metadata.is_file() {
        return Err(format!("not a file: {}", path.display()));
    }
    limits.check_size(metadata.len())?;

    let bytes = std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    decode(&bytes, limits, ImageSource::LocalPath, label)
}

/// Validate image bytes: size limit, a known container format, and a full
/// decode.
pub fn decode(
    bytes: &[u8],
    limits: &ImageLimits,
    source: ImageSource,
    label: String,
) -> std::result::Result<ResolvedImage, String> {
    limits.check_size(bytes.len() as u64)?;

    let format = ImageFormat::detect_from_bytes(bytes)
        .ok_or_else(|| format!("unrecognized image data from {}", source))?;
    let decoded = image::load_from_memory(bytes).map_err(|e| format!("invalid image from {}: {}", source, e))?;

    Ok(ResolvedImage {
        data: bytes.to_vec(),
        format,
        width_px: decoded.width(),
        height_px: decoded.height(),
        source,
        label,
    })
}
