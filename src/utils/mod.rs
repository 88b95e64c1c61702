//! Utility modules for common functionality
//!
//! Logging backend and progress display used by the binaries and the pipeline.

pub mod logger;
pub mod progress;
