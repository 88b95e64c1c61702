//! Window extractor: masks invalid pixels and georeferences the rest

use crate::coordinate::GeoTransform;
use crate::raster::block::PixelBlock;
use crate::raster::window::Window;

/// One valid pixel in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// A value is valid when it is not NaN and differs from nodata
#[inline]
pub fn is_valid(value: f64, nodata: Option<f64>) -> bool {
    !value.is_nan() && nodata.map_or(true, |nodata| value != nodata)
}

/// Emits a point for every valid pixel of `block`, in row-major order
///
/// Coordinates are the centers of the absolute pixels
/// `(window.col_offset + c, window.row_offset + r)`.
pub fn extract(block: &PixelBlock, window: &Window, transform: &GeoTransform,
               nodata: Option<f64>) -> Vec<PixelPoint> {
    let mut points = Vec::new();

    for (r, row) in block.rows().enumerate() {
        for (c, &value) in row.iter().enumerate() {
            if !is_valid(value, nodata) {
                continue;
            }
            let center = transform.pixel_center(window.col_offset + c as u64, window.row_offset + r as u64);
            points.push(PixelPoint { x: center.x, y: center.y, value });
        }
    }

    points
}
