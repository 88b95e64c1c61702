//! I/O primitives shared by the TIFF reader and the raster accessor
//!
//! This module provides the seekable reader abstraction and the byte order
//! strategies used to decode header fields and pixel samples.

pub mod seekable;
pub mod byte_order;
