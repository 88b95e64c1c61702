//! TIFF file format parsing module
//!
//! This module provides structures and functions for reading
//! TIFF and BigTIFF format files, and for writing single-band GeoTIFFs.

pub mod errors;
pub mod ifd;
pub mod types;
pub mod reader;
pub mod writer;
pub mod constants;
pub(crate) mod validation;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFDEntry, IFD};
pub use reader::TiffReader;
pub use types::{SampleKind, TIFF};
pub use writer::{ChunkLayout, GeoTiffWriter};
