//! Output module
//!
//! Durable, incremental destination for harvested records.
//!
//! # Overview
//!
//! This module provides:
//! - `CsvSink` - append-only CSV file, header first, one flushed row per record
//! - `output_path` - deterministic result file naming

mod writer;

pub use writer::{output_path, CsvSink, HEADER};
