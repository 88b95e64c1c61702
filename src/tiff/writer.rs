//! Single-band GeoTIFF writer
//!
//! Writes little-endian classic TIFF files holding one band, stripped or
//! tiled, optionally compressed, with a georeferencing transform and a
//! GDAL nodata tag. Chunk data is laid out first, then out-of-line tag
//! values, then the single IFD, so every offset is known when it is
//! written.

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;
use std::path::Path;

use crate::compression::{predictor, CompressionFactory};
use crate::coordinate::GeoTransform;
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{compression, field_types, geo_keys, header, photometric, planar_config, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::SampleKind;

/// How pixel data is split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLayout {
    /// Full-width strips; the last strip may be shorter
    Strips { rows_per_strip: u32 },
    /// Fixed-size tiles; edge tiles are padded
    Tiles { width: u32, height: u32 },
}

/// A tag value waiting to be serialised
enum TagValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Double(Vec<f64>),
    Ascii(String),
}

impl TagValue {
    fn field_type(&self) -> u16 {
        match self {
            TagValue::Short(_) => field_types::SHORT,
            TagValue::Long(_) => field_types::LONG,
            TagValue::Double(_) => field_types::DOUBLE,
            TagValue::Ascii(_) => field_types::ASCII,
        }
    }

    fn count(&self) -> usize {
        match self {
            TagValue::Short(values) => values.len(),
            TagValue::Long(values) => values.len(),
            TagValue::Double(values) => values.len(),
            TagValue::Ascii(text) => text.len() + 1,
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            TagValue::Short(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            TagValue::Long(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            TagValue::Double(values) => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            TagValue::Ascii(text) => {
                let mut bytes = text.as_bytes().to_vec();
                bytes.push(0);
                bytes
            }
        }
    }
}

/// Builder-style writer for single-band GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffWriter {
    width: u32,
    height: u32,
    kind: SampleKind,
    layout: ChunkLayout,
    compression: u16,
    predictor: u16,
    transform: Option<GeoTransform>,
    nodata: Option<f64>,
    pixel_is_point: bool,
}

impl GeoTiffWriter {
    /// A float32, uncompressed, stripped writer without georeferencing
    pub fn new(width: u32, height: u32) -> Self {
        GeoTiffWriter {
            width,
            height,
            kind: SampleKind::F32,
            layout: ChunkLayout::Strips { rows_per_strip: 16 },
            compression: compression::NONE,
            predictor: crate::tiff::constants::predictor::NONE,
            transform: None,
            nodata: None,
            pixel_is_point: false,
        }
    }

    pub fn with_sample_kind(mut self, kind: SampleKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_rows_per_strip(mut self, rows_per_strip: u32) -> Self {
        self.layout = ChunkLayout::Strips { rows_per_strip };
        self
    }

    pub fn with_tiles(mut self, width: u32, height: u32) -> Self {
        self.layout = ChunkLayout::Tiles { width, height };
        self
    }

    pub fn with_compression(mut self, code: u16) -> Self {
        self.compression = code;
        self
    }

    pub fn with_predictor(mut self, code: u16) -> Self {
        self.predictor = code;
        self
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// Tag the raster as PixelIsPoint; the stored tie point is the
    /// center of pixel (0, 0)
    pub fn with_pixel_is_point(mut self, pixel_is_point: bool) -> Self {
        self.pixel_is_point = pixel_is_point;
        self
    }

    /// Chunk size and grid dimensions `(chunk_width, chunk_height, across, down)`
    fn chunk_grid(&self) -> TiffResult<(u32, u32, u32, u32)> {
        match self.layout {
            ChunkLayout::Strips { rows_per_strip } if rows_per_strip > 0 => {
                Ok((self.width, rows_per_strip, 1, self.height.div_ceil(rows_per_strip)))
            }
            ChunkLayout::Tiles { width, height } if width > 0 && height > 0 => {
                Ok((width, height, self.width.div_ceil(width), self.height.div_ceil(height)))
            }
            _ => Err(TiffError::Generic("Chunk dimensions must be positive".to_string())),
        }
    }

    fn encode_sample(&self, value: f64, out: &mut Vec<u8>) {
        match self.kind {
            SampleKind::U8 => out.push(value as u8),
            SampleKind::I8 => out.push(value as i8 as u8),
            SampleKind::U16 => out.extend_from_slice(&(value as u16).to_le_bytes()),
            SampleKind::I16 => out.extend_from_slice(&(value as i16).to_le_bytes()),
            SampleKind::U32 => out.extend_from_slice(&(value as u32).to_le_bytes()),
            SampleKind::I32 => out.extend_from_slice(&(value as i32).to_le_bytes()),
            SampleKind::F32 => out.extend_from_slice(&(value as f32).to_le_bytes()),
            SampleKind::F64 => out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    /// Encodes, predicts and compresses every chunk in row-major grid order
    fn build_chunks(&self, values: &[f64]) -> TiffResult<Vec<Vec<u8>>> {
        let (chunk_width, chunk_height, across, down) = self.chunk_grid()?;
        let handler = CompressionFactory::create_handler(self.compression as u64)?;
        let tiled = matches!(self.layout, ChunkLayout::Tiles { .. });
        let (width, height) = (self.width as usize, self.height as usize);

        let mut chunks = Vec::with_capacity((across * down) as usize);
        for chunk_row in 0..down as usize {
            for chunk_col in 0..across as usize {
                let top = chunk_row * chunk_height as usize;
                let left = chunk_col * chunk_width as usize;
                let rows = if tiled {
                    chunk_height as usize
                } else {
                    (chunk_height as usize).min(height - top)
                };

                let mut raw = Vec::with_capacity(rows * chunk_width as usize * self.kind.size());
                for r in 0..rows {
                    for c in 0..chunk_width as usize {
                        let (row, col) = (top + r, left + c);
                        let value = if row < height && col < width { values[row * width + col] } else { 0.0 };
                        self.encode_sample(value, &mut raw);
                    }
                }

                predictor::apply(self.predictor, &mut raw, chunk_width as usize, 1,
                                 self.kind, ByteOrder::LittleEndian)?;
                chunks.push(handler.compress(&raw)?);
            }
        }

        Ok(chunks)
    }

    fn geo_tags(&self) -> Vec<(u16, TagValue)> {
        let mut entries = Vec::new();
        let Some(transform) = self.transform else {
            return entries;
        };

        // Store the tie point as the reader should see it once the
        // PixelIsPoint half-pixel shift has been applied.
        let stored = if self.pixel_is_point {
            GeoTransform {
                origin_x: transform.origin_x + 0.5 * (transform.pixel_width + transform.row_rotation),
                origin_y: transform.origin_y + 0.5 * (transform.col_rotation + transform.pixel_height),
                ..transform
            }
        } else {
            transform
        };

        if stored.is_rotated() {
            entries.push((tags::MODEL_TRANSFORMATION_TAG, TagValue::Double(vec![
                stored.pixel_width, stored.row_rotation, 0.0, stored.origin_x,
                stored.col_rotation, stored.pixel_height, 0.0, stored.origin_y,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ])));
        } else {
            entries.push((tags::MODEL_PIXEL_SCALE_TAG,
                          TagValue::Double(vec![stored.pixel_width, -stored.pixel_height, 0.0])));
            entries.push((tags::MODEL_TIEPOINT_TAG,
                          TagValue::Double(vec![0.0, 0.0, 0.0, stored.origin_x, stored.origin_y, 0.0])));
        }

        let raster_type = if self.pixel_is_point { geo_keys::PIXEL_IS_POINT } else { geo_keys::PIXEL_IS_AREA };
        entries.push((tags::GEO_KEY_DIRECTORY_TAG,
                      TagValue::Short(vec![1, 1, 0, 1, geo_keys::RASTER_TYPE, 0, 1, raster_type])));
        entries
    }

    fn offset32(offset: usize) -> TiffResult<u32> {
        u32::try_from(offset)
            .map_err(|_| TiffError::Generic("Raster exceeds the 4 GiB classic TIFF limit".to_string()))
    }

    /// Serialises the raster into an in-memory TIFF file
    ///
    /// `values` holds `width * height` samples in row-major order.
    pub fn to_bytes(&self, values: &[f64]) -> TiffResult<Vec<u8>> {
        if values.len() != self.width as usize * self.height as usize {
            return Err(TiffError::Generic(format!(
                "Expected {} values for a {}x{} raster, got {}",
                self.width as usize * self.height as usize, self.width, self.height, values.len()
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(TiffError::MissingDimensions);
        }

        let chunks = self.build_chunks(values)?;

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&header::LITTLE_ENDIAN_MARKER);
        buffer.write_u16::<LittleEndian>(header::TIFF_VERSION)?;
        buffer.write_u32::<LittleEndian>(0)?;

        let mut chunk_offsets = Vec::with_capacity(chunks.len());
        let mut chunk_counts = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            chunk_offsets.push(Self::offset32(buffer.len())?);
            chunk_counts.push(Self::offset32(chunk.len())?);
            buffer.extend_from_slice(chunk);
            if buffer.len() % 2 == 1 {
                buffer.push(0);
            }
        }

        let bits = (self.kind.size() * 8) as u16;
        let mut entries: Vec<(u16, TagValue)> = vec![
            (tags::IMAGE_WIDTH, TagValue::Long(vec![self.width])),
            (tags::IMAGE_LENGTH, TagValue::Long(vec![self.height])),
            (tags::BITS_PER_SAMPLE, TagValue::Short(vec![bits])),
            (tags::COMPRESSION, TagValue::Short(vec![self.compression])),
            (tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![photometric::BLACK_IS_ZERO])),
            (tags::SAMPLES_PER_PIXEL, TagValue::Short(vec![1])),
            (tags::PLANAR_CONFIGURATION, TagValue::Short(vec![planar_config::CHUNKY])),
            (tags::SAMPLE_FORMAT, TagValue::Short(vec![self.kind.format_code()])),
        ];
        if self.predictor != crate::tiff::constants::predictor::NONE {
            entries.push((tags::PREDICTOR, TagValue::Short(vec![self.predictor])));
        }
        match self.layout {
            ChunkLayout::Strips { rows_per_strip } => {
                entries.push((tags::ROWS_PER_STRIP, TagValue::Long(vec![rows_per_strip])));
                entries.push((tags::STRIP_OFFSETS, TagValue::Long(chunk_offsets)));
                entries.push((tags::STRIP_BYTE_COUNTS, TagValue::Long(chunk_counts)));
            }
            ChunkLayout::Tiles { width, height } => {
                entries.push((tags::TILE_WIDTH, TagValue::Long(vec![width])));
                entries.push((tags::TILE_LENGTH, TagValue::Long(vec![height])));
                entries.push((tags::TILE_OFFSETS, TagValue::Long(chunk_offsets)));
                entries.push((tags::TILE_BYTE_COUNTS, TagValue::Long(chunk_counts)));
            }
        }
        entries.extend(self.geo_tags());
        if let Some(nodata) = self.nodata {
            let text = if nodata.is_nan() { "nan".to_string() } else { nodata.to_string() };
            entries.push((tags::GDAL_NODATA, TagValue::Ascii(text)));
        }
        entries.sort_by_key(|(tag, _)| *tag);

        // Out-of-line values
        let mut fields = Vec::with_capacity(entries.len());
        for (_, value) in &entries {
            let bytes = value.to_bytes();
            if bytes.len() <= 4 {
                let mut field = [0u8; 4];
                field[..bytes.len()].copy_from_slice(&bytes);
                fields.push(field);
            } else {
                fields.push(Self::offset32(buffer.len())?.to_le_bytes());
                buffer.extend_from_slice(&bytes);
                if buffer.len() % 2 == 1 {
                    buffer.push(0);
                }
            }
        }

        let ifd_offset = Self::offset32(buffer.len())?;
        buffer.write_u16::<LittleEndian>(entries.len() as u16)?;
        for ((tag, value), field) in entries.iter().zip(&fields) {
            buffer.write_u16::<LittleEndian>(*tag)?;
            buffer.write_u16::<LittleEndian>(value.field_type())?;
            buffer.write_u32::<LittleEndian>(Self::offset32(value.count())?)?;
            buffer.extend_from_slice(field);
        }
        buffer.write_u32::<LittleEndian>(0)?;
        buffer[4..8].copy_from_slice(&ifd_offset.to_le_bytes());

        debug!("Encoded {}x{} {} raster into {} bytes ({} chunks)",
               self.width, self.height, self.kind, buffer.len(), chunks.len());
        Ok(buffer)
    }

    /// Writes the raster to `path`, replacing any existing file
    pub fn write_to(&self, path: impl AsRef<Path>, values: &[f64]) -> TiffResult<()> {
        let bytes = self.to_bytes(values)?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}
