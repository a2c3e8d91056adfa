//! Result sinks
//!
//! The stdout reporter lives with the detector; this module holds the
//! optional CSV logger used in classic mode.

mod csv;

pub use csv::{CsvSink, CSV_HEADER};
