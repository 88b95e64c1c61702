//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::deflate::AdobeDeflateHandler;
use super::handler::CompressionHandler;
use super::lzw::LzwHandler;
use super::uncompressed::UncompressedHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given compression code
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        match u16::try_from(code) {
            Ok(compression::NONE) => Ok(Box::new(UncompressedHandler)),
            Ok(compression::LZW) => Ok(Box::new(LzwHandler)),
            Ok(compression::DEFLATE) | Ok(compression::DEFLATE_OLD) => Ok(Box::new(AdobeDeflateHandler)),
            Ok(compression::ZSTD) | Ok(compression::ZSTD_GDAL) => Ok(Box::new(ZstdHandler::new())),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }

    /// Get a handler by name
    pub fn get_handler_by_name(name: &str) -> TiffResult<Box<dyn CompressionHandler>> {
        match name.to_lowercase().as_str() {
            "uncompressed" | "none" => Ok(Box::new(UncompressedHandler)),
            "lzw" => Ok(Box::new(LzwHandler)),
            "deflate" | "zip" | "adobe deflate" => Ok(Box::new(AdobeDeflateHandler)),
            "zstd" => Ok(Box::new(ZstdHandler::new())),
            _ => Err(TiffError::Generic(format!("Unknown compression type: {}", name)))
        }
    }
}
