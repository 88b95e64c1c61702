//! Streaming CSV writer for extracted points

use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::pipeline::task::FileOutcome;
use crate::tiff::SampleKind;

/// Column names of the output table
pub const HEADER: [&str; 6] = ["x", "y", "value", "year", "category", "layer"];

/// Sole owner of the output destination
///
/// The header is written on construction; every result is flushed as a
/// whole so the file only ever grows by complete rasters.
pub struct CsvRecordWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvRecordWriter<File> {
    /// Creates (or truncates) the CSV file at `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let file = File::create(path)?;
        Self::from_writer(file)
    }
}

impl<W: Write> CsvRecordWriter<W> {
    pub fn from_writer(inner: W) -> Result<Self, csv::Error> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(CsvRecordWriter { writer, rows: 0 })
    }

    /// Writes every row of `outcome` and flushes; returns the row count
    pub fn write_result(&mut self, outcome: &FileOutcome) -> Result<u64, csv::Error> {
        let mut written = 0;

        for record in outcome.records() {
            self.writer.write_record([
                record.x.to_string(),
                record.y.to_string(),
                format_value(record.value, record.sample_kind),
                record.year.to_string(),
                record.category.to_string(),
                record.layer.to_string(),
            ])?;
            written += 1;
        }

        self.writer.flush()?;
        self.rows += written;
        Ok(written)
    }

    /// Data rows written so far
    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the destination
    pub fn into_inner(self) -> Result<W, csv::Error> {
        self.writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
    }
}

/// Shortest text that reads back as the stored sample
///
/// Decoded values are widened to f64, so f32 samples are narrowed again
/// before printing.
fn format_value(value: f64, kind: SampleKind) -> String {
    match kind {
        SampleKind::F32 => (value as f32).to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RasterFile;
    use crate::pipeline::task::{FileRecords, SkipReason};
    use crate::raster::{PixelPoint, RasterError};
    use std::path::PathBuf;

    fn outcome(points: Vec<PixelPoint>) -> FileOutcome {
        outcome_of_kind(points, SampleKind::F64)
    }

    fn outcome_of_kind(points: Vec<PixelPoint>, sample_kind: SampleKind) -> FileOutcome {
        FileOutcome {
            index: 0,
            file: RasterFile {
                path: PathBuf::from("root/maize/2019/ndvi.tif"),
                category: "maize".to_string(),
                year: 2019,
                filename: "ndvi.tif".to_string(),
            },
            result: Ok(FileRecords { points, windows: 1, failed_windows: 0, sample_kind }),
        }
    }

    fn text(writer: CsvRecordWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn header_is_written_once_up_front() {
        let writer = CsvRecordWriter::from_writer(Vec::new()).unwrap();
        assert_eq!(text(writer), "x,y,value,year,category,layer\n");
    }

    #[test]
    fn writes_rows_with_identity_columns() {
        let mut writer = CsvRecordWriter::from_writer(Vec::new()).unwrap();
        let rows = writer.write_result(&outcome(vec![
            PixelPoint { x: 0.5, y: -1.5, value: 3.0 },
            PixelPoint { x: 10.25, y: 2.0, value: -0.125 },
        ])).unwrap();

        assert_eq!(rows, 2);
        assert_eq!(writer.rows_written(), 2);
        assert_eq!(text(writer), "x,y,value,year,category,layer\n\
                                  0.5,-1.5,3,2019,maize,ndvi.tif\n\
                                  10.25,2,-0.125,2019,maize,ndvi.tif\n");
    }

    #[test]
    fn float32_values_keep_their_stored_digits() {
        let mut writer = CsvRecordWriter::from_writer(Vec::new()).unwrap();
        writer.write_result(&outcome_of_kind(vec![
            PixelPoint { x: 0.5, y: 0.5, value: 0.1f32 as f64 },
            PixelPoint { x: 1.5, y: 0.5, value: 2.7f32 as f64 },
        ], SampleKind::F32)).unwrap();

        assert_eq!(text(writer), "x,y,value,year,category,layer\n\
                                  0.5,0.5,0.1,2019,maize,ndvi.tif\n\
                                  1.5,0.5,2.7,2019,maize,ndvi.tif\n");
    }

    #[test]
    fn integer_and_float64_values_print_exactly() {
        assert_eq!(format_value(-9998.0, SampleKind::I16), "-9998");
        assert_eq!(format_value(0.1, SampleKind::F64), "0.1");
        assert_eq!(format_value(65535.0, SampleKind::U16), "65535");
    }

    #[test]
    fn skipped_result_writes_nothing() {
        let mut writer = CsvRecordWriter::from_writer(Vec::new()).unwrap();
        let mut skipped = outcome(Vec::new());
        skipped.result = Err(SkipReason::Open(RasterError::Unsupported("test".to_string())));

        assert_eq!(writer.write_result(&skipped).unwrap(), 0);
        assert_eq!(text(writer), "x,y,value,year,category,layer\n");
    }
}
