//! Seekable reader trait and chunk helpers
//!
//! Raster chunks are addressed by absolute file offsets, so every reader
//! used by the accessor must support both reading and seeking.

use std::io::{self, Read, Seek, SeekFrom};

/// Trait for readers that can both read and seek
///
/// Implemented for any `Read + Seek + Send` type so that file handles,
/// buffered readers and in-memory cursors can all back a raster.
pub trait SeekableReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekableReader for T {}

/// Reads exactly `len` bytes starting at `offset`
///
/// # Arguments
/// * `reader` - The reader to pull bytes from
/// * `offset` - Absolute offset of the first byte
/// * `len` - Number of bytes to read
///
/// # Returns
/// The bytes read, or an error if the range lies past the end of the data
pub fn read_chunk(reader: &mut dyn SeekableReader, offset: u64, len: usize) -> io::Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_range_from_offset() {
        let mut cursor = Cursor::new((0u8..32).collect::<Vec<_>>());
        let chunk = read_chunk(&mut cursor, 4, 3).unwrap();
        assert_eq!(chunk, vec![4, 5, 6]);
    }

    #[test]
    fn range_past_end_is_an_error() {
        let mut cursor = Cursor::new(vec![0u8; 8]);
        let err = read_chunk(&mut cursor, 6, 4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
