//! Raster accessor: band 1 of one GeoTIFF, read window by window
//!
//! Strips and tiles are both handled as a grid of chunks: a strip is a
//! chunk as wide as the image and `RowsPerStrip` rows tall. A window read
//! decodes every chunk the window overlaps and copies the band 1 samples
//! that fall inside the window.

use log::{debug, info};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::compression::{predictor, CompressionFactory, CompressionHandler};
use crate::coordinate::GeoTransform;
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::read_chunk;
use crate::raster::block::PixelBlock;
use crate::raster::errors::RasterError;
use crate::raster::georef::{Georeference, TransformSource};
use crate::raster::window::{Window, WindowIter};
use crate::tiff::constants::{compression as compression_codes, planar_config, predictor as predictor_codes,
                             sample_format, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::types::SampleKind;
use crate::tiff::validation;

/// Default edge length of the windows used for stripped rasters
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

/// Largest decoded chunk a raster may declare
pub const MAX_CHUNK_BYTES: u64 = 1 << 30;

/// Options controlling how a raster is split into windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorOptions {
    /// Window edge length for rasters without a native tile grid
    pub block_size: u32,
}

impl Default for AccessorOptions {
    fn default() -> Self {
        AccessorOptions { block_size: DEFAULT_BLOCK_SIZE }
    }
}

/// Location of the compressed chunks of band 1
#[derive(Debug, Clone)]
struct ChunkGrid {
    chunk_width: u64,
    chunk_height: u64,
    across: u64,
    down: u64,
    offsets: Vec<u64>,
    byte_counts: Vec<u64>,
}

impl ChunkGrid {
    fn from_ifd(tiff_reader: &TiffReader, reader: &mut BufReader<File>, ifd: &IFD,
                width: u64, height: u64) -> Result<Self, RasterError> {
        let (chunk_width, chunk_height, offsets_tag, counts_tag) = if ifd.is_tiled() {
            let tile_width = ifd.get_tag_value(tags::TILE_WIDTH).unwrap_or(0);
            let tile_height = ifd.get_tag_value(tags::TILE_LENGTH).unwrap_or(0);
            (tile_width, tile_height, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP).unwrap_or(height).min(height);
            (width, rows_per_strip, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        if chunk_width == 0 || chunk_height == 0 {
            return Err(RasterError::Unsupported(format!(
                "chunk size {}x{} is empty", chunk_width, chunk_height
            )));
        }

        let offsets = tiff_reader.read_tag_values(reader, ifd, offsets_tag)?;
        let byte_counts = tiff_reader.read_tag_values(reader, ifd, counts_tag)?;
        let across = width.div_ceil(chunk_width);
        let down = height.div_ceil(chunk_height);
        let needed = (across * down) as usize;

        if offsets.len() < needed || byte_counts.len() < needed {
            return Err(RasterError::Unsupported(format!(
                "{} chunk offsets and {} byte counts declared, {} needed",
                offsets.len(), byte_counts.len(), needed
            )));
        }

        Ok(ChunkGrid { chunk_width, chunk_height, across, down, offsets, byte_counts })
    }

    fn chunk_count(&self) -> u64 {
        self.across * self.down
    }

    /// Size of one decoded chunk, `None` on overflow
    fn decoded_bytes(&self, samples_per_chunk_pixel: u64, sample_size: u64) -> Option<u64> {
        self.chunk_width
            .checked_mul(self.chunk_height)?
            .checked_mul(samples_per_chunk_pixel)?
            .checked_mul(sample_size)
    }
}

/// Structural summary of an opened raster
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub path: PathBuf,
    pub width: u64,
    pub height: u64,
    pub is_big_tiff: bool,
    pub byte_order: ByteOrder,
    pub tiled: bool,
    pub chunk_width: u64,
    pub chunk_height: u64,
    pub chunk_count: u64,
    pub sample_kind: SampleKind,
    pub samples_per_pixel: u64,
    pub planar_configuration: u16,
    pub compression: &'static str,
    pub compression_code: u64,
    pub predictor: u16,
    pub georeference: Georeference,
    pub window_size: (u64, u64),
    pub window_count: usize,
}

impl fmt::Display for RasterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path.display())?;
        writeln!(f, "  Format: {} ({})", if self.is_big_tiff { "BigTIFF" } else { "TIFF" }, self.byte_order.name())?;
        writeln!(f, "  Dimensions: {}x{}", self.width, self.height)?;
        writeln!(f, "  Layout: {} {}x{} ({} chunks)",
                 if self.tiled { "tiles" } else { "strips" },
                 self.chunk_width, self.chunk_height, self.chunk_count)?;
        writeln!(f, "  Samples: {} x {} (planar configuration {})",
                 self.samples_per_pixel, self.sample_kind, self.planar_configuration)?;
        writeln!(f, "  Compression: {} ({}), predictor {}", self.compression, self.compression_code, self.predictor)?;
        writeln!(f, "  Geotransform: {} [{}]", self.georeference.transform, self.georeference.source)?;
        if self.georeference.pixel_is_point {
            writeln!(f, "  Raster type: PixelIsPoint")?;
        }
        match self.georeference.nodata {
            Some(nodata) => writeln!(f, "  Nodata: {}", nodata)?,
            None => writeln!(f, "  Nodata: none")?,
        }
        write!(f, "  Windows: {} of {}x{}", self.window_count, self.window_size.0, self.window_size.1)
    }
}

/// An open GeoTIFF, positioned for window reads of band 1
pub struct RasterHandle {
    path: PathBuf,
    reader: BufReader<File>,
    file_size: u64,
    width: u64,
    height: u64,
    is_big_tiff: bool,
    byte_order: ByteOrder,
    handler: Box<dyn ByteOrderHandler>,
    kind: SampleKind,
    samples_per_pixel: u64,
    planar_configuration: u16,
    compression: Box<dyn CompressionHandler>,
    compression_code: u64,
    predictor: u16,
    grid: ChunkGrid,
    tiled: bool,
    georeference: Georeference,
    block_size: u64,
}

impl RasterHandle {
    /// Opens `path` and validates everything needed to read band 1
    pub fn open(path: impl AsRef<Path>, options: &AccessorOptions) -> Result<Self, RasterError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| RasterError::Open { path: path.clone(), source })?;
        let mut reader = BufReader::new(file);

        let mut tiff_reader = TiffReader::new();
        let tiff = tiff_reader.read(&mut reader)?;
        let ifd = tiff.main_ifd().ok_or(TiffError::NoImage)?;

        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        if width == 0 || height == 0 {
            return Err(TiffError::MissingDimensions.into());
        }

        let samples_per_pixel = ifd.get_samples_per_pixel();
        if samples_per_pixel == 0 {
            return Err(RasterError::Unsupported("zero samples per pixel".to_string()));
        }

        let planar_configuration = ifd.get_planar_configuration();
        if planar_configuration != planar_config::CHUNKY && planar_configuration != planar_config::PLANAR {
            return Err(RasterError::Unsupported(format!(
                "planar configuration {}", planar_configuration
            )));
        }

        let bits = first_value(&tiff_reader, &mut reader, ifd, tags::BITS_PER_SAMPLE, 1)?;
        let format = first_value(&tiff_reader, &mut reader, ifd, tags::SAMPLE_FORMAT,
                                 sample_format::UNSIGNED as u64)?;
        let kind = SampleKind::from_tags(format as u16, bits as u16)?;

        let compression_code = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1);
        let compression = CompressionFactory::create_handler(compression_code)?;

        let predictor = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(1) as u16;
        let predictor_supported = match predictor {
            predictor_codes::NONE => true,
            predictor_codes::HORIZONTAL_DIFFERENCING => !kind.is_float(),
            predictor_codes::FLOATING_POINT => kind.is_float(),
            _ => false,
        };
        if !predictor_supported {
            return Err(RasterError::Unsupported(format!("predictor {} for {} samples", predictor, kind)));
        }

        let grid = ChunkGrid::from_ifd(&tiff_reader, &mut reader, ifd, width, height)?;
        let file_size = validation::get_file_size(&mut reader)?;

        // Chunks are decoded whole, so their declared size bounds memory use
        let samples_per_chunk_pixel = if planar_configuration == planar_config::PLANAR { 1 } else { samples_per_pixel };
        let chunk_bytes = grid.decoded_bytes(samples_per_chunk_pixel, kind.size() as u64)
            .filter(|&bytes| bytes <= MAX_CHUNK_BYTES)
            .ok_or_else(|| RasterError::Unsupported(format!(
                "chunk size {}x{} exceeds the {} byte decode limit",
                grid.chunk_width, grid.chunk_height, MAX_CHUNK_BYTES
            )))?;
        if compression_code == compression_codes::NONE as u64 && chunk_bytes > file_size {
            return Err(RasterError::Unsupported(format!(
                "uncompressed chunk of {} bytes cannot fit in a {} byte file", chunk_bytes, file_size
            )));
        }

        let name = path.display().to_string();
        let georeference = Georeference::read(&tiff_reader, &mut reader, ifd, kind, &name)?;

        info!("Opened {} ({}x{} {}, {} {}x{}, {})", name, width, height, kind,
              if ifd.is_tiled() { "tiles" } else { "strips" },
              grid.chunk_width, grid.chunk_height, compression.name());

        Ok(RasterHandle {
            path,
            reader,
            file_size,
            width,
            height,
            is_big_tiff: tiff.is_big_tiff,
            byte_order: tiff.byte_order,
            handler: tiff.byte_order.create_handler(),
            kind,
            samples_per_pixel,
            planar_configuration,
            compression,
            compression_code,
            predictor,
            tiled: ifd.is_tiled(),
            grid,
            georeference,
            block_size: options.block_size.max(1) as u64,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `(width, height)` in pixels
    pub fn dimensions(&self) -> (u64, u64) {
        (self.width, self.height)
    }

    pub fn sample_kind(&self) -> SampleKind {
        self.kind
    }

    pub fn geotransform(&self) -> GeoTransform {
        self.georeference.transform
    }

    /// Nodata sentinel; `None` means only NaN marks invalid pixels
    pub fn nodata(&self) -> Option<f64> {
        self.georeference.nodata
    }

    /// Whether the file carried any georeferencing
    pub fn is_georeferenced(&self) -> bool {
        self.georeference.source != TransformSource::Missing
    }

    /// Lazy row-major enumeration of the windows covering the raster
    ///
    /// Tiled rasters use their tile grid, with tiles larger than the
    /// block size split into block-sized windows; stripped rasters use
    /// square blocks of the configured block size.
    pub fn windows(&self) -> WindowIter {
        if self.tiled {
            WindowIter::new(self.width, self.height,
                            self.grid.chunk_width.min(self.block_size),
                            self.grid.chunk_height.min(self.block_size))
        } else {
            WindowIter::new(self.width, self.height, self.block_size, self.block_size)
        }
    }

    /// Reads band 1 inside `window`
    pub fn read_window(&mut self, window: &Window) -> Result<PixelBlock, RasterError> {
        if !window.fits_within(self.width, self.height) {
            return Err(RasterError::WindowOutOfBounds {
                window: *window,
                width: self.width,
                height: self.height,
            });
        }

        let (out_width, out_height) = (window.width as usize, window.height as usize);
        let pixels = usize::try_from(window.pixel_count())
            .map_err(|_| RasterError::Unsupported(format!("window {} is too large", window)))?;
        let mut values = Vec::new();
        values.try_reserve_exact(pixels)
            .map_err(|e| RasterError::Unsupported(format!("window {}: {}", window, e)))?;
        values.resize(pixels, 0.0);
        let grid = &self.grid;
        let (chunk_width, chunk_height) = (grid.chunk_width, grid.chunk_height);

        let first_chunk_row = window.row_offset / chunk_height;
        let last_chunk_row = (window.end_row() - 1) / chunk_height;
        let first_chunk_col = window.col_offset / chunk_width;
        let last_chunk_col = (window.end_col() - 1) / chunk_width;
        let (across, fill) = (grid.across, self.georeference.nodata.unwrap_or(0.0));

        // Samples between consecutive pixels of band 1 inside a chunk
        let stride = if self.planar_configuration == planar_config::PLANAR {
            1
        } else {
            self.samples_per_pixel as usize
        };
        let sample_size = self.kind.size();

        for chunk_row in first_chunk_row..=last_chunk_row {
            for chunk_col in first_chunk_col..=last_chunk_col {
                let index = (chunk_row * across + chunk_col) as usize;
                let top = chunk_row * chunk_height;
                let left = chunk_col * chunk_width;

                let row_start = window.row_offset.max(top);
                let row_end = window.end_row().min(top + chunk_height);
                let col_start = window.col_offset.max(left);
                let col_end = window.end_col().min(left + chunk_width);

                let chunk = self.decode_chunk(index)?;
                let Some(data) = chunk else {
                    for row in row_start..row_end {
                        let out_row = (row - window.row_offset) as usize * out_width;
                        for col in col_start..col_end {
                            values[out_row + (col - window.col_offset) as usize] = fill;
                        }
                    }
                    continue;
                };

                let last_needed = ((row_end - 1 - top) * chunk_width + (col_end - 1 - left)) as usize;
                let needed_bytes = (last_needed * stride + 1) * sample_size;
                if data.len() < needed_bytes {
                    return Err(RasterError::CorruptChunk {
                        index,
                        message: format!("decoded to {} bytes, at least {} expected", data.len(), needed_bytes),
                    });
                }

                for row in row_start..row_end {
                    let out_row = (row - window.row_offset) as usize * out_width;
                    let chunk_row_start = ((row - top) * chunk_width) as usize;
                    for col in col_start..col_end {
                        let sample = (chunk_row_start + (col - left) as usize) * stride * sample_size;
                        values[out_row + (col - window.col_offset) as usize] =
                            self.handler.decode_sample(&data[sample..], self.kind);
                    }
                }
            }
        }

        debug!("Read window {} of {}", window, self.path.display());
        Ok(PixelBlock::new(out_height, out_width, values, self.georeference.nodata))
    }

    /// Reads, decompresses and un-predicts one chunk of band 1
    ///
    /// Returns `None` for sparse chunks (zero offset or byte count).
    fn decode_chunk(&mut self, index: usize) -> Result<Option<Vec<u8>>, RasterError> {
        let offset = self.grid.offsets[index];
        let byte_count = self.grid.byte_counts[index];
        if offset == 0 || byte_count == 0 {
            return Ok(None);
        }

        validation::validate_data_range(offset, byte_count, self.file_size)
            .map_err(|e| RasterError::CorruptChunk { index, message: e.to_string() })?;
        let compressed = read_chunk(&mut self.reader, offset, byte_count as usize).map_err(TiffError::from)?;

        let mut data = self.compression.decompress(&compressed)
            .map_err(|e| RasterError::CorruptChunk { index, message: e.to_string() })?;

        let samples_per_row_pixel = if self.planar_configuration == planar_config::PLANAR {
            1
        } else {
            self.samples_per_pixel as usize
        };
        predictor::undo(self.predictor, &mut data, self.grid.chunk_width as usize,
                        samples_per_row_pixel, self.kind, self.byte_order)?;

        Ok(Some(data))
    }

    /// Structural summary for `--inspect`
    pub fn describe(&self) -> RasterInfo {
        let windows = self.windows();
        RasterInfo {
            path: self.path.clone(),
            width: self.width,
            height: self.height,
            is_big_tiff: self.is_big_tiff,
            byte_order: self.byte_order,
            tiled: self.tiled,
            chunk_width: self.grid.chunk_width,
            chunk_height: self.grid.chunk_height,
            chunk_count: self.grid.chunk_count(),
            sample_kind: self.kind,
            samples_per_pixel: self.samples_per_pixel,
            planar_configuration: self.planar_configuration,
            compression: self.compression.name(),
            compression_code: self.compression_code,
            predictor: self.predictor,
            georeference: self.georeference,
            window_size: windows.block_size(),
            window_count: windows.len(),
        }
    }
}

/// First value of an integer tag, or `default` when the tag is absent
fn first_value(tiff_reader: &TiffReader, reader: &mut BufReader<File>, ifd: &IFD,
               tag: u16, default: u64) -> Result<u64, RasterError> {
    if !ifd.has_tag(tag) {
        return Ok(default);
    }
    let values = tiff_reader.read_tag_values(reader, ifd, tag)?;
    values.first().copied().ok_or_else(|| {
        RasterError::Unsupported(format!("tag {} has no values", tags::name(tag)))
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tiff::constants::compression;
    use crate::tiff::writer::GeoTiffWriter;
    use approx::assert_relative_eq;
    use tempfile::TempDir;

    fn ramp(width: usize, height: usize) -> Vec<f64> {
        (0..width * height).map(|v| v as f64).collect()
    }

    fn read_all(handle: &mut RasterHandle) -> Vec<f64> {
        let (width, height) = handle.dimensions();
        let mut full = vec![f64::NAN; (width * height) as usize];
        for window in handle.windows() {
            let block = handle.read_window(&window).unwrap();
            for r in 0..block.height() {
                for c in 0..block.width() {
                    let row = window.row_offset as usize + r;
                    let col = window.col_offset as usize + c;
                    full[row * width as usize + col] = block.get(r, c);
                }
            }
        }
        full
    }

    #[test]
    fn stripped_raster_reads_back_through_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strips.tif");
        let values = ramp(37, 23);
        GeoTiffWriter::new(37, 23).with_rows_per_strip(5).write_to(&path, &values).unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions { block_size: 16 }).unwrap();
        assert_eq!(handle.windows().len(), 6);
        assert_eq!(read_all(&mut handle), values);
    }

    #[test]
    fn tiled_raster_uses_the_tile_grid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiles.tif");
        let values = ramp(40, 20);
        GeoTiffWriter::new(40, 20)
            .with_sample_kind(SampleKind::U16)
            .with_tiles(16, 16)
            .write_to(&path, &values)
            .unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        let windows: Vec<Window> = handle.windows().collect();
        assert_eq!(windows.len(), 6);
        assert_eq!(windows[2], Window::new(0, 32, 16, 8));
        assert_eq!(read_all(&mut handle), values);
    }

    #[test]
    fn tiles_larger_than_the_block_size_are_split() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big_tiles.tif");
        let values = ramp(40, 20);
        GeoTiffWriter::new(40, 20)
            .with_tiles(32, 32)
            .write_to(&path, &values)
            .unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions { block_size: 16 }).unwrap();
        let windows: Vec<Window> = handle.windows().collect();
        assert_eq!(windows.len(), 6);
        assert!(windows.iter().all(|w| w.width <= 16 && w.height <= 16));
        assert_eq!(windows[2], Window::new(0, 32, 16, 8));
        assert_eq!(read_all(&mut handle), values);
    }

    #[test]
    fn oversized_tiles_are_rejected_at_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge_tiles.tif");
        std::fs::write(&path, oversized_tile_tiff()).unwrap();

        let result = RasterHandle::open(&path, &AccessorOptions::default());
        assert!(matches!(result, Err(RasterError::Unsupported(_))));
    }

    #[test]
    fn uncompressed_chunks_larger_than_the_file_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.tif");
        let mut bytes = GeoTiffWriter::new(4, 4).to_bytes(&ramp(4, 4)).unwrap();
        // Claim 100000 rows per strip on a raster declared 100000 rows tall
        for tag in [tags::IMAGE_LENGTH, tags::ROWS_PER_STRIP] {
            let entry = find_entry(&bytes, tag);
            bytes[entry + 8..entry + 12].copy_from_slice(&100_000u32.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();

        let result = RasterHandle::open(&path, &AccessorOptions::default());
        assert!(matches!(result, Err(RasterError::Unsupported(_))));
    }

    #[test]
    fn every_codec_and_predictor_decodes() {
        let dir = TempDir::new().unwrap();
        let values: Vec<f64> = (0..30 * 12).map(|v| (v % 97) as f64 - 40.0).collect();
        let cases = [
            (SampleKind::I16, compression::LZW, 2),
            (SampleKind::I32, compression::DEFLATE, 2),
            (SampleKind::U8, compression::ZSTD_GDAL, 1),
            (SampleKind::F32, compression::DEFLATE, 3),
            (SampleKind::F64, compression::LZW, 3),
            (SampleKind::F32, compression::ZSTD, 1),
        ];

        for (i, (kind, code, predictor)) in cases.into_iter().enumerate() {
            let path = dir.path().join(format!("case{}.tif", i));
            let expected: Vec<f64> = if kind == SampleKind::U8 {
                values.iter().map(|v| v + 40.0).collect()
            } else {
                values.clone()
            };
            GeoTiffWriter::new(30, 12)
                .with_sample_kind(kind)
                .with_rows_per_strip(4)
                .with_compression(code)
                .with_predictor(predictor)
                .write_to(&path, &expected)
                .unwrap();

            let mut handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
            assert_eq!(read_all(&mut handle), expected, "{} / {} / {}", kind, code, predictor);
        }
    }

    #[test]
    fn exposes_transform_and_normalized_nodata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("geo.tif");
        GeoTiffWriter::new(2, 2)
            .with_transform(GeoTransform::north_up(500000.0, 4200000.0, 30.0, 30.0))
            .with_nodata(0.1)
            .write_to(&path, &[0.1, 1.0, 2.0, 3.0])
            .unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        assert!(handle.is_georeferenced());
        assert_relative_eq!(handle.geotransform().origin_x, 500000.0);
        assert_relative_eq!(handle.geotransform().pixel_height, -30.0);

        let block = handle.read_window(&Window::new(0, 0, 2, 2)).unwrap();
        assert_eq!(handle.nodata(), Some(block.get(0, 0)));
    }

    #[test]
    fn pixel_is_point_rasters_are_shifted_back_to_corners() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("point.tif");
        let transform = GeoTransform::north_up(10.0, 20.0, 2.0, 2.0);
        GeoTiffWriter::new(1, 1)
            .with_transform(transform)
            .with_pixel_is_point(true)
            .write_to(&path, &[1.0])
            .unwrap();

        let handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        assert_relative_eq!(handle.geotransform().origin_x, 10.0);
        assert_relative_eq!(handle.geotransform().origin_y, 20.0);
        assert!(handle.describe().georeference.pixel_is_point);
    }

    #[test]
    fn missing_georeferencing_falls_back_to_pixel_space() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.tif");
        GeoTiffWriter::new(2, 1).write_to(&path, &[1.0, 2.0]).unwrap();

        let handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        assert!(!handle.is_georeferenced());
        assert_eq!(handle.geotransform(), GeoTransform::identity());
        assert_eq!(handle.nodata(), None);
    }

    #[test]
    fn out_of_bounds_window_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("small.tif");
        GeoTiffWriter::new(4, 4).write_to(&path, &[0.0; 16]).unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        assert!(matches!(
            handle.read_window(&Window::new(2, 2, 4, 4)),
            Err(RasterError::WindowOutOfBounds { .. })
        ));
        assert!(handle.read_window(&Window::new(0, 0, 0, 4)).is_err());
    }

    #[test]
    fn missing_file_and_garbage_fail_to_open() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.tif");
        assert!(matches!(
            RasterHandle::open(&missing, &AccessorOptions::default()),
            Err(RasterError::Open { .. })
        ));

        let garbage = dir.path().join("garbage.tif");
        std::fs::write(&garbage, b"this is not a tiff").unwrap();
        assert!(matches!(
            RasterHandle::open(&garbage, &AccessorOptions::default()),
            Err(RasterError::Tiff(_))
        ));
    }

    #[test]
    fn undecodable_chunk_is_reported_as_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relabelled.tif");
        let bytes = GeoTiffWriter::new(4, 4)
            .with_rows_per_strip(2)
            .to_bytes(&ramp(4, 4))
            .unwrap();
        let mut corrupt = bytes;
        // Relabel the uncompressed strips as deflate so they fail to inflate
        let compression_entry = find_entry(&corrupt, tags::COMPRESSION);
        corrupt[compression_entry + 8..compression_entry + 10].copy_from_slice(&8u16.to_le_bytes());
        std::fs::write(&path, &corrupt).unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions { block_size: 2 }).unwrap();
        let first = handle.windows().next().unwrap();
        assert!(matches!(handle.read_window(&first), Err(RasterError::CorruptChunk { .. })));
    }

    #[test]
    fn describe_reports_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("info.tif");
        GeoTiffWriter::new(64, 32)
            .with_tiles(32, 32)
            .with_compression(compression::DEFLATE)
            .with_nodata(-9999.0)
            .write_to(&path, &vec![1.0; 64 * 32])
            .unwrap();

        let handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        let info = handle.describe();
        assert!(info.tiled);
        assert_eq!(info.chunk_count, 2);
        assert_eq!(info.window_count, 2);
        assert_eq!(info.compression, "Adobe Deflate");

        let text = info.to_string();
        assert!(text.contains("Dimensions: 64x32"));
        assert!(text.contains("Nodata: -9999"));
    }

    #[test]
    fn sparse_chunks_read_as_nodata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sparse.tif");
        let mut bytes = GeoTiffWriter::new(3, 3)
            .with_rows_per_strip(3)
            .with_nodata(-1.0)
            .to_bytes(&ramp(3, 3))
            .unwrap();
        let offsets_entry = find_entry(&bytes, tags::STRIP_OFFSETS);
        bytes[offsets_entry + 8..offsets_entry + 12].copy_from_slice(&0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let mut handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
        assert_eq!(read_all(&mut handle), vec![-1.0; 9]);
    }

    /// 2x2 uint8 raster with two samples per pixel; band 1 is 1 2 3 4
    fn two_sample_tiff(planar: u16) -> Vec<u8> {
        use byteorder::{LittleEndian, WriteBytesExt};

        let mut buf = Vec::new();
        buf.extend_from_slice(b"II");
        buf.write_u16::<LittleEndian>(42).unwrap();
        buf.write_u32::<LittleEndian>(0).unwrap();

        let (offsets_field, counts_field, strips) = if planar == planar_config::CHUNKY {
            buf.extend_from_slice(&[1, 10, 2, 20, 3, 30, 4, 40]);
            (8u32, 8u32, 1u32)
        } else {
            buf.extend_from_slice(&[1, 2, 3, 4, 10, 20, 30, 40]);
            for value in [8u32, 12, 4, 4] {
                buf.write_u32::<LittleEndian>(value).unwrap();
            }
            (16u32, 24u32, 2u32)
        };

        let ifd_offset = buf.len() as u32;
        buf[4..8].copy_from_slice(&ifd_offset.to_le_bytes());
        let entries: [(u16, u16, u32, u32); 9] = [
            (tags::IMAGE_WIDTH, 3, 1, 2),
            (tags::IMAGE_LENGTH, 3, 1, 2),
            (tags::BITS_PER_SAMPLE, 3, 2, 8 | (8 << 16)),
            (tags::COMPRESSION, 3, 1, 1),
            (tags::STRIP_OFFSETS, 4, strips, offsets_field),
            (tags::SAMPLES_PER_PIXEL, 3, 1, 2),
            (tags::ROWS_PER_STRIP, 4, 1, 2),
            (tags::STRIP_BYTE_COUNTS, 4, strips, counts_field),
            (tags::PLANAR_CONFIGURATION, 3, 1, planar as u32),
        ];
        buf.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
        for (tag, field_type, count, value) in entries {
            buf.write_u16::<LittleEndian>(tag).unwrap();
            buf.write_u16::<LittleEndian>(field_type).unwrap();
            buf.write_u32::<LittleEndian>(count).unwrap();
            buf.write_u32::<LittleEndian>(value).unwrap();
        }
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf
    }

    #[test]
    fn reads_band_one_of_multi_sample_rasters() {
        let dir = TempDir::new().unwrap();
        for planar in [planar_config::CHUNKY, planar_config::PLANAR] {
            let path = dir.path().join(format!("two_samples_{}.tif", planar));
            std::fs::write(&path, two_sample_tiff(planar)).unwrap();

            let mut handle = RasterHandle::open(&path, &AccessorOptions::default()).unwrap();
            assert_eq!(read_all(&mut handle), vec![1.0, 2.0, 3.0, 4.0], "planar {}", planar);
        }
    }

    /// uint8 raster declaring one 3,000,000 x 3,000,000 tile backed by 4 bytes
    pub(crate) fn oversized_tile_tiff() -> Vec<u8> {
        use byteorder::{LittleEndian, WriteBytesExt};

        let mut buf = Vec::new();
        buf.extend_from_slice(b"II");
        buf.write_u16::<LittleEndian>(42).unwrap();
        buf.write_u32::<LittleEndian>(12).unwrap();
        buf.extend_from_slice(&[1, 2, 3, 4]);

        let side = 3_000_000u32;
        let entries: [(u16, u16, u32, u32); 8] = [
            (tags::IMAGE_WIDTH, 4, 1, side),
            (tags::IMAGE_LENGTH, 4, 1, side),
            (tags::BITS_PER_SAMPLE, 3, 1, 8),
            (tags::COMPRESSION, 3, 1, 1),
            (tags::TILE_WIDTH, 4, 1, side),
            (tags::TILE_LENGTH, 4, 1, side),
            (tags::TILE_OFFSETS, 4, 1, 8),
            (tags::TILE_BYTE_COUNTS, 4, 1, 4),
        ];
        buf.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
        for (tag, field_type, count, value) in entries {
            buf.write_u16::<LittleEndian>(tag).unwrap();
            buf.write_u16::<LittleEndian>(field_type).unwrap();
            buf.write_u32::<LittleEndian>(count).unwrap();
            buf.write_u32::<LittleEndian>(value).unwrap();
        }
        buf.write_u32::<LittleEndian>(0).unwrap();
        buf
    }

    /// Byte offset of the IFD entry for `tag` in a little-endian classic TIFF
    pub(crate) fn find_entry(bytes: &[u8], tag: u16) -> usize {
        let ifd = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let count = u16::from_le_bytes([bytes[ifd], bytes[ifd + 1]]) as usize;
        (0..count)
            .map(|i| ifd + 2 + i * 12)
            .find(|&entry| u16::from_le_bytes([bytes[entry], bytes[entry + 1]]) == tag)
            .unwrap()
    }
}
