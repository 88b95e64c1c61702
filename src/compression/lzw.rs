//! Handler for LZW compressed data

use weezl::decode::Decoder;
use weezl::encode::Encoder;
use weezl::BitOrder;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// TIFF flavoured LZW handler (compression code 5)
///
/// TIFF LZW is MSB-first with the early code size switch.
pub struct LzwHandler;

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut decoder = Decoder::with_tiff_size_switch(BitOrder::Msb, 8);
        decoder.decode(data).map_err(|e| TiffError::Decompression {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = Encoder::with_tiff_size_switch(BitOrder::Msb, 8);
        encoder
            .encode(data)
            .map_err(|e| TiffError::Generic(format!("LZW compression error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "LZW"
    }

    fn code(&self) -> u64 {
        compression::LZW as u64
    }
}
