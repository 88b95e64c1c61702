//! Raster access and pixel extraction
//!
//! [`RasterHandle`] opens one GeoTIFF and reads band 1 window by window;
//! [`extract`] turns a window's pixels into georeferenced points.

pub mod accessor;
pub mod block;
pub mod errors;
pub mod extract;
pub mod georef;
pub mod window;

pub use accessor::{AccessorOptions, RasterHandle, RasterInfo};
pub use block::PixelBlock;
pub use errors::RasterError;
pub use extract::{extract, is_valid, PixelPoint};
pub use georef::Georeference;
pub use window::{Window, WindowIter};
