//! Bounded-concurrency GeoTIFF point extraction
//!
//! Walks a `category/year` raster catalog, decodes every GeoTIFF window
//! by window on a fixed worker pool and streams the valid pixels as
//! georeferenced points into a single CSV table.

pub mod io;
pub mod tiff;
pub mod compression;
pub mod coordinate;
pub mod raster;
pub mod catalog;
pub mod pipeline;
pub mod output;
pub mod config;
pub mod utils;
pub mod commands;

pub use catalog::{Catalog, CatalogOptions, RasterFile};
pub use config::PipelineConfig;
pub use coordinate::GeoTransform;
pub use output::CsvRecordWriter;
pub use pipeline::{CancellationToken, Pipeline, PipelineError, RunSummary};
pub use raster::{AccessorOptions, RasterHandle};
pub use tiff::{GeoTiffWriter, TiffReader};
