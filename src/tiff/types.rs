//! Core TIFF data structures

use std::fmt;

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::sample_format;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;

/// Represents a TIFF file with its Image File Directories (IFDs)
#[derive(Debug)]
pub struct TIFF {
    /// Image File Directories in the TIFF file
    pub ifds: Vec<IFD>,
    /// Whether this is a BigTIFF format
    pub is_big_tiff: bool,
    /// Byte order of every multi-byte field in the file
    pub byte_order: ByteOrder,
}

impl TIFF {
    /// Creates a new empty TIFF structure
    pub fn new(is_big_tiff: bool, byte_order: ByteOrder) -> Self {
        TIFF {
            ifds: Vec::new(),
            is_big_tiff,
            byte_order,
        }
    }

    /// Returns the main (first) IFD if available
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// Returns the number of IFDs in the TIFF file
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }
}

impl fmt::Display for TIFF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Byte order: {}", self.byte_order.name())?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        if let Some(ifd) = self.main_ifd() {
            write!(f, "{}", ifd)?;
        }

        Ok(())
    }
}

/// Numeric type of one band sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleKind {
    /// Resolves the sample type from SampleFormat and BitsPerSample
    pub fn from_tags(format: u16, bits: u16) -> TiffResult<Self> {
        let kind = match (format, bits) {
            (sample_format::UNSIGNED, 8) => SampleKind::U8,
            (sample_format::SIGNED, 8) => SampleKind::I8,
            (sample_format::UNSIGNED, 16) => SampleKind::U16,
            (sample_format::SIGNED, 16) => SampleKind::I16,
            (sample_format::UNSIGNED, 32) => SampleKind::U32,
            (sample_format::SIGNED, 32) => SampleKind::I32,
            (sample_format::IEEEFP, 32) => SampleKind::F32,
            (sample_format::IEEEFP, 64) => SampleKind::F64,
            _ => return Err(TiffError::UnsupportedSampleFormat { format, bits }),
        };
        Ok(kind)
    }

    /// Size of one sample in bytes
    pub fn size(&self) -> usize {
        match self {
            SampleKind::U8 | SampleKind::I8 => 1,
            SampleKind::U16 | SampleKind::I16 => 2,
            SampleKind::U32 | SampleKind::I32 | SampleKind::F32 => 4,
            SampleKind::F64 => 8,
        }
    }

    /// The SampleFormat tag value for this kind
    pub fn format_code(&self) -> u16 {
        match self {
            SampleKind::U8 | SampleKind::U16 | SampleKind::U32 => sample_format::UNSIGNED,
            SampleKind::I8 | SampleKind::I16 | SampleKind::I32 => sample_format::SIGNED,
            SampleKind::F32 | SampleKind::F64 => sample_format::IEEEFP,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, SampleKind::F32 | SampleKind::F64)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleKind::U8 => "uint8",
            SampleKind::I8 => "int8",
            SampleKind::U16 => "uint16",
            SampleKind::I16 => "int16",
            SampleKind::U32 => "uint32",
            SampleKind::I32 => "int32",
            SampleKind::F32 => "float32",
            SampleKind::F64 => "float64",
        }
    }

    /// Rounds a nodata value to the precision samples of this kind carry
    ///
    /// Decoded float32 samples are widened to f64, so a nodata of `0.1`
    /// only matches once it has gone through the same narrowing.
    pub fn normalize_nodata(&self, nodata: f64) -> f64 {
        match self {
            SampleKind::F32 => nodata as f32 as f64,
            _ => nodata,
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
