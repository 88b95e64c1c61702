//! TIFF file reader implementation
//!
//! This module implements the TIFF/BigTIFF file reader that uses the
//! Strategy pattern to handle different byte orders.

use byteorder::ReadBytesExt;
use log::{debug, warn};
use std::io::{Cursor, Read, SeekFrom};

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::{read_chunk, SeekableReader};
use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFDEntry, IFD};
use crate::tiff::types::TIFF;
use crate::tiff::validation;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader {
    /// Current byte order handler
    byte_order_handler: Option<Box<dyn ByteOrderHandler>>,
    /// Whether currently reading BigTIFF format
    is_big_tiff: bool,
}

impl Default for TiffReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TiffReader {
    /// Creates a new TIFF reader
    pub fn new() -> Self {
        TiffReader {
            byte_order_handler: None,
            is_big_tiff: false,
        }
    }

    /// Returns the byte order handler, or an error before `read` succeeded
    fn handler(&self) -> TiffResult<&dyn ByteOrderHandler> {
        self.byte_order_handler
            .as_deref()
            .ok_or_else(|| TiffError::Generic("Byte order not yet determined".to_string()))
    }

    /// Reads a TIFF file from the given reader
    ///
    /// This method handles the core process of reading a TIFF file:
    /// 1. Detect byte order (little/big endian)
    /// 2. Check for TIFF or BigTIFF format
    /// 3. Read all IFDs (Image File Directories)
    pub fn read(&mut self, reader: &mut dyn SeekableReader) -> TiffResult<TIFF> {
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(reader)?;
        debug!("Detected byte order: {}", byte_order.name());
        let handler = byte_order.create_handler();

        let version = handler.read_u16(reader)?;
        self.is_big_tiff = match version {
            header::BIG_TIFF_VERSION => {
                validation::validate_bigtiff_header(reader, handler.as_ref())?;
                true
            }
            header::TIFF_VERSION => false,
            _ => return Err(TiffError::UnsupportedVersion(version)),
        };
        debug!("Detected {} format", if self.is_big_tiff { "BigTIFF" } else { "standard TIFF" });

        let first_ifd_offset = self.read_offset(reader, handler.as_ref())?;
        self.byte_order_handler = Some(handler);

        let file_size = validation::get_file_size(reader)?;
        validation::validate_ifd_offset(first_ifd_offset, file_size)?;

        let mut tiff = TIFF::new(self.is_big_tiff, byte_order);
        tiff.ifds = self.read_ifd_chain(reader, first_ifd_offset, file_size)?;
        if tiff.ifds.is_empty() {
            return Err(TiffError::NoImage);
        }

        debug!("Read {} IFDs from TIFF file", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads an offset field, 4 bytes in classic TIFF and 8 in BigTIFF
    fn read_offset(&self, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler) -> TiffResult<u64> {
        if self.is_big_tiff {
            Ok(handler.read_u64(reader)?)
        } else {
            Ok(handler.read_u32(reader)? as u64)
        }
    }

    /// Size of an IFD in bytes, up to and excluding the next-IFD offset
    fn ifd_size(&self, entry_count: u64) -> u64 {
        if self.is_big_tiff {
            8 + 20 * entry_count
        } else {
            2 + 12 * entry_count
        }
    }

    /// Reads a chain of IFDs starting from the given offset
    ///
    /// A broken first IFD is an error; a broken later link ends the chain.
    fn read_ifd_chain(&self, reader: &mut dyn SeekableReader, first_ifd_offset: u64,
                      file_size: u64) -> TiffResult<Vec<IFD>> {
        let handler = self.handler()?;
        let mut ifds = Vec::new();
        let mut ifd_offset = first_ifd_offset;

        while ifd_offset != 0 && ifds.len() < header::MAX_IFDS {
            let ifd = match self.read_ifd(reader, ifd_offset, ifds.len(), file_size) {
                Ok(ifd) => ifd,
                Err(e) if ifds.is_empty() => return Err(e),
                Err(e) => {
                    warn!("Error reading IFD {}: {}", ifds.len(), e);
                    break;
                }
            };

            let next_offset_position = ifd_offset + self.ifd_size(ifd.entry_count() as u64);
            ifds.push(ifd);

            if next_offset_position >= file_size {
                break;
            }
            reader.seek(SeekFrom::Start(next_offset_position))?;
            let next_ifd_offset = match self.read_offset(reader, handler) {
                Ok(offset) => offset,
                Err(e) => {
                    warn!("Error reading next IFD offset: {}", e);
                    break;
                }
            };

            if next_ifd_offset != 0 && (next_ifd_offset >= file_size || next_ifd_offset < 8) {
                warn!("Invalid next IFD offset: {}, stopping IFD chain", next_ifd_offset);
                break;
            }
            ifd_offset = next_ifd_offset;
        }

        Ok(ifds)
    }

    /// Reads an IFD from the reader
    ///
    /// An IFD consists of an entry count followed by that many entries.
    pub fn read_ifd(&self, reader: &mut dyn SeekableReader, offset: u64, number: usize,
                    file_size: u64) -> TiffResult<IFD> {
        let handler = self.handler()?;
        reader.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            handler.read_u64(reader)?
        } else {
            handler.read_u16(reader)? as u64
        };
        validation::validate_data_range(offset, self.ifd_size(entry_count), file_size)?;
        debug!("IFD #{} at offset {} has {} entries", number, offset, entry_count);

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            ifd.add_entry(self.read_ifd_entry(reader, handler)?);
        }

        Ok(ifd)
    }

    /// Reads a single IFD entry
    fn read_ifd_entry(&self, reader: &mut dyn SeekableReader, handler: &dyn ByteOrderHandler) -> TiffResult<IFDEntry> {
        let tag = handler.read_u16(reader)?;
        let field_type = handler.read_u16(reader)?;
        let count = self.read_offset(reader, handler)?;

        let field_len = if self.is_big_tiff { 8 } else { 4 };
        let mut raw = [0u8; 8];
        reader.read_exact(&mut raw[..field_len])?;

        let mut field = Cursor::new(&raw[..field_len]);
        let inline_scalar = count == 1
            && field_types::size(field_type).map_or(false, |size| size <= field_len);
        let value_offset = if inline_scalar {
            match field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => raw[0] as u64,
                field_types::SHORT | field_types::SSHORT => handler.read_u16(&mut field)? as u64,
                field_types::LONG | field_types::SLONG | field_types::FLOAT => handler.read_u32(&mut field)? as u64,
                _ => handler.read_u64(&mut field)?,
            }
        } else {
            self.read_offset(&mut field, handler)?
        };

        Ok(IFDEntry::new(tag, field_type, count, value_offset, raw))
    }

    /// Returns the undecoded value bytes of an entry, inline or from the file
    fn entry_bytes(&self, reader: &mut dyn SeekableReader, entry: &IFDEntry) -> TiffResult<Vec<u8>> {
        let size = entry.data_size().ok_or(TiffError::UnsupportedFieldType {
            tag: entry.tag,
            field_type: entry.field_type,
        })?;

        if entry.is_value_inline(self.is_big_tiff) {
            return Ok(entry.raw[..size as usize].to_vec());
        }

        let file_size = validation::get_file_size(reader)?;
        validation::validate_data_range(entry.value_offset, size, file_size)?;
        Ok(read_chunk(reader, entry.value_offset, size as usize)?)
    }

    /// Reads a tag's value as a vector of u64
    ///
    /// Accepts any unsigned or signed integer field type.
    pub fn read_tag_values(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let handler = self.handler()?;
        let bytes = self.entry_bytes(reader, entry)?;
        let mut data = Cursor::new(bytes.as_slice());

        let mut values = Vec::with_capacity(entry.count as usize);
        for _ in 0..entry.count {
            let value = match entry.field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED => data.read_u8()? as u64,
                field_types::SHORT | field_types::SSHORT => handler.read_u16(&mut data)? as u64,
                field_types::LONG | field_types::SLONG => handler.read_u32(&mut data)? as u64,
                field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => handler.read_u64(&mut data)?,
                field_type => return Err(TiffError::UnsupportedFieldType { tag, field_type }),
            };
            values.push(value);
        }

        Ok(values)
    }

    /// Reads a tag's value as a vector of f64
    ///
    /// Accepts DOUBLE, FLOAT and RATIONAL fields; integer fields are widened.
    pub fn read_tag_f64s(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let handler = self.handler()?;

        let values = match entry.field_type {
            field_types::DOUBLE | field_types::FLOAT | field_types::RATIONAL => {
                let bytes = self.entry_bytes(reader, entry)?;
                let mut data = Cursor::new(bytes.as_slice());
                let mut values = Vec::with_capacity(entry.count as usize);
                for _ in 0..entry.count {
                    let value = match entry.field_type {
                        field_types::DOUBLE => handler.read_f64(&mut data)?,
                        field_types::FLOAT => handler.read_f32(&mut data)? as f64,
                        _ => {
                            let numerator = handler.read_u32(&mut data)? as f64;
                            let denominator = handler.read_u32(&mut data)? as f64;
                            numerator / denominator
                        }
                    };
                    values.push(value);
                }
                values
            }
            _ => self.read_tag_values(reader, ifd, tag)?
                .into_iter()
                .map(|v| v as f64)
                .collect(),
        };

        Ok(values)
    }

    /// Reads an ASCII tag, with trailing NUL characters removed
    pub fn read_tag_ascii(&self, reader: &mut dyn SeekableReader, ifd: &IFD, tag: u16) -> TiffResult<String> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        if entry.field_type != field_types::ASCII {
            return Err(TiffError::UnsupportedFieldType { tag, field_type: entry.field_type });
        }

        let mut bytes = self.entry_bytes(reader, entry)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }

        String::from_utf8(bytes)
            .map_err(|e| TiffError::Generic(format!("Invalid UTF-8 string: {}", e)))
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }
}
