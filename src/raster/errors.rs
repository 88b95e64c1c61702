//! Accessor-level error type

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::raster::window::Window;
use crate::tiff::errors::TiffError;

/// Errors raised while opening a raster or reading one of its windows
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Tiff(#[from] TiffError),
    #[error("unsupported raster layout: {0}")]
    Unsupported(String),
    #[error("window {window} lies outside the {width}x{height} raster")]
    WindowOutOfBounds { window: Window, width: u64, height: u64 },
    #[error("chunk {index} is corrupt: {message}")]
    CorruptChunk { index: usize, message: String },
}
