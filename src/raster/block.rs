//! Decoded pixel values of one window

/// `height x width` band values of one window in row-major order,
/// widened to `f64`, with the raster's nodata sentinel
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBlock {
    height: usize,
    width: usize,
    values: Vec<f64>,
    nodata: Option<f64>,
}

impl PixelBlock {
    /// Wraps row-major values; `values.len()` must equal `height * width`
    pub fn new(height: usize, width: usize, values: Vec<f64>, nodata: Option<f64>) -> Self {
        debug_assert_eq!(values.len(), height * width);
        PixelBlock { height, width, values, nodata }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Value at window-relative `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.width + col]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterates rows as slices, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks(self.width.max(1))
    }
}
