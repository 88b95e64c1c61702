//! Catalog walker
//!
//! Enumerates the rasters of a `root/<category>/<year>/<file>` tree in
//! file-name order. Only the walk is lazy; nothing is opened here.

use log::{debug, info, warn};
use regex::Regex;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Depth of raster files below the root
const FILE_DEPTH: usize = 3;

/// A four digit run not embedded in a longer number
const YEAR_PATTERN: &str = r"(?:^|[^0-9])(\d{4})(?:[^0-9]|$)";

/// Errors raised while walking a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog root {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("catalog walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid year pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One raster of the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterFile {
    pub path: PathBuf,
    pub category: String,
    pub year: i32,
    /// File name including extension; becomes the `layer` column
    pub filename: String,
}

impl fmt::Display for RasterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.category, self.year, self.filename)
    }
}

/// Which files count as rasters
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Accepted extensions without the dot, compared case-insensitively
    pub extensions: Vec<String>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        CatalogOptions {
            extensions: vec!["tif".to_string(), "tiff".to_string()],
        }
    }
}

/// A category/year raster tree
pub struct Catalog {
    root: PathBuf,
    extensions: Vec<String>,
    year_pattern: Regex,
}

impl Catalog {
    /// Opens the catalog at `root`
    ///
    /// Fails when the root is not a readable directory.
    pub fn new(root: impl AsRef<Path>, options: &CatalogOptions) -> Result<Self, CatalogError> {
        let root = root.as_ref().to_path_buf();
        fs::read_dir(&root).map_err(|source| CatalogError::Root { path: root.clone(), source })?;

        let extensions = options.extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Ok(Catalog {
            root,
            extensions,
            year_pattern: Regex::new(YEAR_PATTERN)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Year contained in a directory name, if any
    pub fn parse_year(&self, name: &str) -> Option<i32> {
        self.year_pattern
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Lazily walks the tree, yielding rasters sorted by path components
    pub fn files(&self) -> impl Iterator<Item = Result<RasterFile, CatalogError>> + '_ {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(FILE_DEPTH)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| self.enter(entry))
            .filter_map(move |entry| match entry {
                Ok(entry) => self.raster_file(entry).map(Ok),
                Err(e) => Some(Err(CatalogError::Walk(e))),
            })
    }

    /// Prunes the walk to category and year directories
    fn enter(&self, entry: &DirEntry) -> bool {
        let is_dir = entry.file_type().is_dir();
        let name = entry.file_name().to_string_lossy();

        match entry.depth() {
            1 if is_dir => {
                info!("Scanning category {}", name);
                true
            }
            2 if is_dir => match self.parse_year(&name) {
                Some(year) => {
                    info!("Scanning {}/{}", parent_name(entry.path()).unwrap_or_default(), year);
                    true
                }
                None => {
                    warn!("Skipping {}: directory name has no year", entry.path().display());
                    false
                }
            },
            FILE_DEPTH => true,
            _ => {
                debug!("Ignoring {}", entry.path().display());
                false
            }
        }
    }

    fn raster_file(&self, entry: DirEntry) -> Option<RasterFile> {
        if !entry.file_type().is_file() || !self.accepts(entry.path()) {
            return None;
        }

        let path = entry.into_path();
        let year_dir = path.parent()?;
        let year = self.parse_year(&year_dir.file_name()?.to_string_lossy())?;
        let category = parent_name(year_dir)?;
        let filename = path.file_name()?.to_string_lossy().into_owned();

        Some(RasterFile { path, category, year, filename })
    }

    fn accepts(&self, path: &Path) -> bool {
        let ext = path.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        self.extensions.iter().any(|accepted| *accepted == ext)
    }
}

/// Name of the directory containing `path`
fn parent_name(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
