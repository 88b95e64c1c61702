//! Byte order handling for TIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian) when reading header fields
//! and when decoding pixel samples out of decompressed chunks.

use byteorder::{BigEndian, ByteOrder as Endianness, LittleEndian, ReadBytesExt};
use std::io::Result;
use std::marker::PhantomData;

use crate::io::seekable::SeekableReader;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::SampleKind;

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the first two bytes of a TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        let marker = [reader.read_u8()?, reader.read_u8()?];
        match &marker {
            b"II" => Ok(ByteOrder::LittleEndian),
            b"MM" => Ok(ByteOrder::BigEndian),
            _ => Err(TiffError::InvalidByteOrder(u16::from_le_bytes(marker))),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler::new()),
            ByteOrder::BigEndian => Box::new(BigEndianHandler::new()),
        }
    }
}

/// Trait for byte order handling strategies
pub trait ByteOrderHandler: Send + Sync {
    /// The byte order this handler decodes
    fn byte_order(&self) -> ByteOrder;

    /// Read a u16 value
    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16>;

    /// Read a u32 value
    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32>;

    /// Read a u64 value
    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64>;

    /// Read an f32 value
    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32>;

    /// Read an f64 value
    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64>;

    /// Decode one pixel sample from the start of `bytes`
    ///
    /// `bytes` must hold at least `kind.size()` bytes.
    fn decode_sample(&self, bytes: &[u8], kind: SampleKind) -> f64;
}

/// Handler generic over the `byteorder` endianness marker
pub struct EndianHandler<E> {
    order: ByteOrder,
    _endianness: PhantomData<E>,
}

/// Little-endian byte order handler
pub type LittleEndianHandler = EndianHandler<LittleEndian>;

/// Big-endian byte order handler
pub type BigEndianHandler = EndianHandler<BigEndian>;

impl LittleEndianHandler {
    pub fn new() -> Self {
        EndianHandler { order: ByteOrder::LittleEndian, _endianness: PhantomData }
    }
}

impl Default for LittleEndianHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl BigEndianHandler {
    pub fn new() -> Self {
        EndianHandler { order: ByteOrder::BigEndian, _endianness: PhantomData }
    }
}

impl Default for BigEndianHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Endianness + Send + Sync> ByteOrderHandler for EndianHandler<E> {
    fn byte_order(&self) -> ByteOrder {
        self.order
    }

    fn read_u16(&self, reader: &mut dyn SeekableReader) -> Result<u16> {
        reader.read_u16::<E>()
    }

    fn read_u32(&self, reader: &mut dyn SeekableReader) -> Result<u32> {
        reader.read_u32::<E>()
    }

    fn read_u64(&self, reader: &mut dyn SeekableReader) -> Result<u64> {
        reader.read_u64::<E>()
    }

    fn read_f32(&self, reader: &mut dyn SeekableReader) -> Result<f32> {
        reader.read_f32::<E>()
    }

    fn read_f64(&self, reader: &mut dyn SeekableReader) -> Result<f64> {
        reader.read_f64::<E>()
    }

    fn decode_sample(&self, bytes: &[u8], kind: SampleKind) -> f64 {
        match kind {
            SampleKind::U8 => bytes[0] as f64,
            SampleKind::I8 => bytes[0] as i8 as f64,
            SampleKind::U16 => E::read_u16(bytes) as f64,
            SampleKind::I16 => E::read_i16(bytes) as f64,
            SampleKind::U32 => E::read_u32(bytes) as f64,
            SampleKind::I32 => E::read_i32(bytes) as f64,
            SampleKind::F32 => E::read_f32(bytes) as f64,
            SampleKind::F64 => E::read_f64(bytes),
        }
    }
}
