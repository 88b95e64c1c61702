//! Per-file extraction task
//!
//! Runs the raster accessor and the window extractor over every window of
//! one file. All failures stay inside the returned [`FileOutcome`].

use log::{debug, info, warn};
use thiserror::Error;

use crate::catalog::RasterFile;
use crate::pipeline::pool::TaskError;
use crate::raster::{extract, AccessorOptions, PixelPoint, RasterError, RasterHandle};
use crate::tiff::SampleKind;

/// Why a file contributed no records
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("cannot open raster: {0}")]
    Open(#[source] RasterError),

    #[error("extraction crashed: {0}")]
    Crashed(#[source] TaskError),
}

/// Points extracted from one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecords {
    pub points: Vec<PixelPoint>,
    pub windows: usize,
    pub failed_windows: usize,
    /// Storage type of the band the values were decoded from
    pub sample_kind: SampleKind,
}

impl FileRecords {
    pub fn new(sample_kind: SampleKind) -> Self {
        FileRecords { points: Vec::new(), windows: 0, failed_windows: 0, sample_kind }
    }
}

/// One output row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractedRecord<'a> {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub sample_kind: SampleKind,
    pub year: i32,
    pub category: &'a str,
    pub layer: &'a str,
}

/// Result of one file task, tagged with its submission index
#[derive(Debug)]
pub struct FileOutcome {
    pub index: usize,
    pub file: RasterFile,
    pub result: Result<FileRecords, SkipReason>,
}

impl FileOutcome {
    pub fn skipped(index: usize, file: RasterFile, reason: SkipReason) -> Self {
        FileOutcome { index, file, result: Err(reason) }
    }

    pub fn is_skipped(&self) -> bool {
        self.result.is_err()
    }

    pub fn failed_windows(&self) -> usize {
        self.result.as_ref().map_or(0, |records| records.failed_windows)
    }

    pub fn point_count(&self) -> usize {
        self.result.as_ref().map_or(0, |records| records.points.len())
    }

    /// Rows of this file in extraction order; empty when skipped
    pub fn records(&self) -> impl Iterator<Item = ExtractedRecord<'_>> {
        let (points, sample_kind) = match &self.result {
            Ok(records) => (records.points.as_slice(), records.sample_kind),
            Err(_) => (&[][..], SampleKind::F64),
        };

        points.iter().map(move |point| ExtractedRecord {
            x: point.x,
            y: point.y,
            value: point.value,
            sample_kind,
            year: self.file.year,
            category: &self.file.category,
            layer: &self.file.filename,
        })
    }
}

/// Extracts every valid pixel of `file`
///
/// Never fails: an unopenable file is skipped, an unreadable window only
/// loses its own pixels.
pub fn run_file_task(index: usize, file: RasterFile, options: &AccessorOptions) -> FileOutcome {
    let mut handle = match RasterHandle::open(&file.path, options) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("Skipping {}: {}", file, e);
            return FileOutcome::skipped(index, file, SkipReason::Open(e));
        }
    };

    let transform = handle.geotransform();
    let nodata = handle.nodata();
    let mut records = FileRecords::new(handle.sample_kind());

    for window in handle.windows() {
        records.windows += 1;
        match handle.read_window(&window) {
            Ok(block) => {
                let points = extract(&block, &window, &transform, nodata);
                debug!("{} window {}: {} valid pixels", file, window, points.len());
                records.points.extend(points);
            }
            Err(e) => {
                warn!("{}: dropping window {}: {}", file, window, e);
                records.failed_windows += 1;
            }
        }
    }

    info!("{}: {} points from {} windows ({} failed)",
          file, records.points.len(), records.windows, records.failed_windows);

    FileOutcome { index, file, result: Ok(records) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::GeoTransform;
    use crate::raster::accessor::tests::{find_entry, oversized_tile_tiff};
    use crate::tiff::constants::{compression, tags};
    use crate::tiff::GeoTiffWriter;
    use std::path::Path;
    use tempfile::TempDir;

    fn raster_file(path: &Path) -> RasterFile {
        RasterFile {
            path: path.to_path_buf(),
            category: "wheat".to_string(),
            year: 2012,
            filename: "yield.tif".to_string(),
        }
    }

    #[test]
    fn extracts_all_windows_of_a_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yield.tif");
        let values: Vec<f64> = (0..12).map(|v| v as f64).collect();
        GeoTiffWriter::new(4, 3)
            .with_rows_per_strip(1)
            .with_transform(GeoTransform::north_up(0.0, 3.0, 1.0, 1.0))
            .with_nodata(0.0)
            .write_to(&path, &values)
            .unwrap();

        let options = AccessorOptions { block_size: 2 };
        let outcome = run_file_task(7, raster_file(&path), &options);

        assert_eq!(outcome.index, 7);
        let records = outcome.result.as_ref().unwrap();
        assert_eq!(records.windows, 4);
        assert_eq!(records.failed_windows, 0);
        assert_eq!(outcome.point_count(), 11);

        let rows: Vec<ExtractedRecord> = outcome.records().collect();
        assert!(rows.iter().all(|row| row.year == 2012 && row.category == "wheat" && row.layer == "yield.tif"));
        let mut values: Vec<f64> = rows.iter().map(|row| row.value).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, (1..12).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn unopenable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.tif");
        std::fs::write(&path, b"not a tiff at all").unwrap();

        let outcome = run_file_task(0, raster_file(&path), &AccessorOptions::default());

        assert!(outcome.is_skipped());
        assert!(matches!(outcome.result, Err(SkipReason::Open(_))));
        assert_eq!(outcome.records().count(), 0);
        assert_eq!(outcome.failed_windows(), 0);
    }

    #[test]
    fn oversized_tiles_skip_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.tif");
        std::fs::write(&path, oversized_tile_tiff()).unwrap();

        let outcome = run_file_task(0, raster_file(&path), &AccessorOptions::default());

        assert!(matches!(outcome.result, Err(SkipReason::Open(RasterError::Unsupported(_)))));
        assert_eq!(outcome.point_count(), 0);
    }

    /// `(offset, byte_count)` of strip `index` in a little-endian classic TIFF
    fn strip_location(bytes: &[u8], index: usize) -> (usize, usize) {
        let read = |tag| {
            let entry = find_entry(bytes, tag);
            let array = u32::from_le_bytes(bytes[entry + 8..entry + 12].try_into().unwrap()) as usize + index * 4;
            u32::from_le_bytes(bytes[array..array + 4].try_into().unwrap()) as usize
        };
        (read(tags::STRIP_OFFSETS), read(tags::STRIP_BYTE_COUNTS))
    }

    #[test]
    fn corrupt_window_loses_only_its_own_pixels() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yield.tif");
        let mut bytes = GeoTiffWriter::new(2, 4)
            .with_rows_per_strip(2)
            .with_compression(compression::DEFLATE)
            .to_bytes(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
            .unwrap();
        let (offset, count) = strip_location(&bytes, 1);
        bytes[offset..offset + count].fill(0xff);
        std::fs::write(&path, &bytes).unwrap();

        // One 2x2 window per strip
        let outcome = run_file_task(0, raster_file(&path), &AccessorOptions { block_size: 2 });

        assert!(!outcome.is_skipped());
        let records = outcome.result.as_ref().unwrap();
        assert_eq!(records.windows, 2);
        assert_eq!(records.failed_windows, 1);
        let values: Vec<f64> = outcome.records().map(|row| row.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
    }
}
