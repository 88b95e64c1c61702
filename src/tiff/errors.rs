//! Custom error types for TIFF processing

use std::io;
use thiserror::Error;

/// TIFF-specific error types
#[derive(Debug, Error)]
pub enum TiffError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Invalid byte order marker
    #[error("Invalid byte order marker: {0:#06x}")]
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    #[error("Invalid BigTIFF header")]
    InvalidBigTiffHeader,
    /// Unsupported TIFF version
    #[error("Unsupported TIFF version: {0}")]
    UnsupportedVersion(u16),
    /// Tag not found
    #[error("Tag not found: {0}")]
    TagNotFound(u16),
    /// Unsupported field type for the requested tag
    #[error("Unsupported field type {field_type} for tag {tag}")]
    UnsupportedFieldType { tag: u16, field_type: u16 },
    /// Unsupported compression method
    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u64),
    /// Unsupported sample layout
    #[error("Unsupported sample format {format} with {bits} bits per sample")]
    UnsupportedSampleFormat { format: u16, bits: u16 },
    /// Image dimensions not found
    #[error("Image dimensions not found")]
    MissingDimensions,
    /// The file contains no image directory
    #[error("TIFF file contains no image")]
    NoImage,
    /// A codec failed on a chunk
    #[error("{codec} decompression failed: {message}")]
    Decompression { codec: &'static str, message: String },
    /// Generic error with message
    #[error("TIFF error: {0}")]
    Generic(String),
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::Generic(msg)
    }
}
