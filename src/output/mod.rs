//! Output table serialization

pub mod writer;

pub use writer::{CsvRecordWriter, HEADER};
