//! Writes a small synthetic `category/year/*.tif` catalog
//!
//! Every raster is a smooth field with a band of nodata cells and a few
//! NaN cells, in a mix of layouts and codecs, so a pipeline run over the
//! tree exercises the masking and the decoders.

use clap::{value_parser, Arg, Command};
use log::{error, info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use gridpoints::tiff::constants::{compression, predictor};
use gridpoints::tiff::{GeoTiffWriter, SampleKind, TiffResult};
use gridpoints::utils::logger::Logger;
use gridpoints::GeoTransform;

const CATEGORIES: [&str; 3] = ["maize", "rice", "wheat"];
const YEARS: [i32; 2] = [2019, 2020];
const NODATA: f64 = -9999.0;

fn main() {
    let matches = Command::new("generate_sample")
        .about("Write a synthetic GeoTIFF catalog for trying gridpoints")
        .arg(
            Arg::new("output")
                .help("Directory to create the catalog in")
                .value_name("DIR")
                .default_value("sample_data")
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .help("Width and height of each raster in pixels")
                .value_name("PIXELS")
                .default_value("256")
                .value_parser(value_parser!(u32).range(2..)),
        )
        .get_matches();

    if let Err(e) = Logger::init_global_logger(None, LevelFilter::Info) {
        eprintln!("Error setting up logger: {}", e);
        process::exit(1);
    }

    let root = matches.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| PathBuf::from("sample_data"));
    let size = matches.get_one::<u32>("size").copied().unwrap_or(256);

    match generate(&root, size) {
        Ok(count) => info!("Wrote {} rasters under {}", count, root.display()),
        Err(e) => {
            error!("Failed to write sample catalog: {}", e);
            process::exit(1);
        }
    }
}

fn generate(root: &Path, size: u32) -> TiffResult<usize> {
    let mut count = 0;

    for (c, category) in CATEGORIES.iter().enumerate() {
        for (y, year) in YEARS.iter().enumerate() {
            let dir = root.join(category).join(year.to_string());
            fs::create_dir_all(&dir)?;

            let seed = (c * YEARS.len() + y) as u64;
            let values = field(size, seed);
            let transform = GeoTransform::north_up(-10.0 + c as f64 * 5.0, 50.0 - y as f64 * 5.0,
                                                   0.01, 0.01);

            let writer = match seed % 3 {
                0 => GeoTiffWriter::new(size, size)
                    .with_tiles(64, 64)
                    .with_compression(compression::DEFLATE)
                    .with_predictor(predictor::FLOATING_POINT),
                1 => GeoTiffWriter::new(size, size)
                    .with_rows_per_strip(8)
                    .with_compression(compression::LZW),
                _ => GeoTiffWriter::new(size, size)
                    .with_sample_kind(SampleKind::I16)
                    .with_tiles(32, 32)
                    .with_compression(compression::ZSTD_GDAL)
                    .with_predictor(predictor::HORIZONTAL_DIFFERENCING),
            };

            let path = dir.join(format!("{}_{}.tif", category, year));
            writer.with_transform(transform)
                .with_nodata(NODATA)
                .write_to(&path, &values)?;
            info!("Wrote {}", path.display());
            count += 1;
        }
    }

    Ok(count)
}

/// Smooth values with a nodata stripe and scattered NaN cells
///
/// NaN becomes 0 in integer rasters.
fn field(size: u32, seed: u64) -> Vec<f64> {
    let size = size as usize;
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut values = Vec::with_capacity(size * size);

    for row in 0..size {
        for col in 0..size {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let value = if row == size / 2 {
                NODATA
            } else if state >> 58 == 0 {
                f64::NAN
            } else {
                let (r, c) = (row as f64 / size as f64, col as f64 / size as f64);
                (100.0 * (r * 3.0).sin() * (c * 2.0).cos()).round()
            };
            values.push(value);
        }
    }

    values
}
