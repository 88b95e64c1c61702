//! Coordinate handling for geospatial data
//!
//! This module provides the point type and the affine transform that maps
//! pixel positions of a raster to coordinates in its reference system.

mod point;
mod transform;

pub use self::point::Point;
pub use self::transform::GeoTransform;
