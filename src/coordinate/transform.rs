//! Affine pixel-to-world transformation

use std::fmt;

use super::point::Point;

/// Affine transform from pixel space `(col, row)` to world space `(x, y)`
///
/// Coefficients follow GDAL ordering:
/// `x = origin_x + pixel_width * col + row_rotation * row` and
/// `y = origin_y + col_rotation * col + pixel_height * row`.
/// Pixel `(col, row)` covers the square from `(col, row)` to
/// `(col + 1, row + 1)` in pixel space, so its center is at `+0.5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    /// Negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Build from the six GDAL coefficients `[c, a, b, f, d, e]`
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        let [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height] = coefficients;
        GeoTransform { origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height }
    }

    /// The six GDAL coefficients `[c, a, b, f, d, e]`
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, self.row_rotation,
         self.origin_y, self.col_rotation, self.pixel_height]
    }

    /// Pixel space: `x = col`, `y = row`
    pub fn identity() -> Self {
        Self::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// North-up transform with the upper-left corner at `(origin_x, origin_y)`
    ///
    /// `pixel_size_y` is the positive pixel height; rows run southwards.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_size_x: f64, pixel_size_y: f64) -> Self {
        Self::from_gdal([origin_x, pixel_size_x, 0.0, origin_y, 0.0, -pixel_size_y])
    }

    /// From a ModelTiepointTag `(i, j, k, x, y, z)` and ModelPixelScaleTag `(sx, sy, sz)`
    ///
    /// Returns `None` when either array is too short.
    pub fn from_tiepoint_scale(tiepoint: &[f64], scale: &[f64]) -> Option<Self> {
        if tiepoint.len() < 6 || scale.len() < 2 {
            return None;
        }
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);

        Some(Self::north_up(x - i * sx, y + j * sy, sx, sy))
    }

    /// From a row-major 4x4 ModelTransformationTag matrix
    pub fn from_model_transformation(matrix: &[f64]) -> Option<Self> {
        if matrix.len() < 16 {
            return None;
        }
        Some(Self::from_gdal([matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5]]))
    }

    /// Moves the origin half a pixel up-left
    ///
    /// Rasters tagged PixelIsPoint anchor their tie point on the center of
    /// the first pixel instead of its corner.
    pub fn shifted_for_pixel_is_point(&self) -> Self {
        GeoTransform {
            origin_x: self.origin_x - 0.5 * (self.pixel_width + self.row_rotation),
            origin_y: self.origin_y - 0.5 * (self.col_rotation + self.pixel_height),
            ..*self
        }
    }

    /// Whether the transform has rotation or shear terms
    pub fn is_rotated(&self) -> bool {
        self.row_rotation != 0.0 || self.col_rotation != 0.0
    }

    /// Maps a continuous pixel-space position to world coordinates
    pub fn apply(&self, col: f64, row: f64) -> Point {
        Point::new(
            self.origin_x + self.pixel_width * col + self.row_rotation * row,
            self.origin_y + self.col_rotation * col + self.pixel_height * row,
        )
    }

    /// World coordinates of the center of pixel `(col, row)`
    pub fn pixel_center(&self, col: u64, row: u64) -> Point {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {}, {}, {})",
               self.origin_x, self.pixel_width, self.row_rotation,
               self.origin_y, self.col_rotation, self.pixel_height)
    }
}
