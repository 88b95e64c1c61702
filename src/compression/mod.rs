//! Compression handling for TIFF files
//!
//! This module implements strategies for handling different compression
//! methods, plus the predictor transforms applied before compression.

mod handler;
mod uncompressed;
mod deflate;
mod lzw;
mod factory;
mod zstd;
pub mod predictor;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use lzw::LzwHandler;
pub use factory::CompressionFactory;
pub use zstd::ZstdHandler;
