//! CSV Importer Library
//! # Overview
//!
//! This library imports delimited text (CSV, TSV, semicolon exports, ...) from a
//! file or a string, line by line, into caller-defined records. Files are streamed
//! in fixed-size chunks, so memory stays bounded by the longest line plus the
//! records produced.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (LineEnding, FieldList, errors and diagnostics)
//! - [`io`] - Byte sources to lines:
//!   - [`io::line_ending`] - Terminator detection
//!   - [`io::chunked_reader`] - Streaming, encoding-aware line reader
//!   - [`io::string_source`] - Lines of in-memory text
//! - [`core`] - Lines to records:
//!   - [`core::field_splitter`] - Delimiter splitting with quote repair
//!   - [`core::record_structurer`] - Header-keyed records
//!   - [`core::traits`] - Mapper traits
//! - [`importer`] - The importer facade with blocking and background entry points
//! - [`cli`] - CLI arguments parsing and logging setup
//!
//! # Import Modes
//!
//! - **Fields**: every line becomes `Vec<String>` and is handed to a mapper
//! - **Structured**: the first line is the header; every later line becomes a
//!   header-keyed map, and lines of the wrong width are skipped
//!
//! # Example
//!
//! ```
//! use csv_importer::{CsvImporter, ImporterConfig, StructuredRecord};
//!
//! let importer = CsvImporter::from_text("id,name\n1,Alice\n2,\"Bob, Jr.\"", ImporterConfig::default()).unwrap();
//! let names = importer
//!     .import_structured((|_: &[String]| {}, |record: StructuredRecord| record["name"].clone()))
//!     .unwrap();
//! assert_eq!(names, vec!["Alice", "Bob, Jr."]);
//! ```
//!
//! # Diagnostics
//!
//! Lines that cannot be used (undecodable bytes, wrong width, an unterminated
//! quote) are reported as `tracing` warnings with target
//! [`DIAGNOSTICS_TARGET`] and never stop an import.

// Module declarations
pub mod cli;
pub mod core;
pub mod importer;
pub mod io;
pub mod types;

pub use core::{Deserialized, FieldSplitter, RecordMapper, RecordStructure, StructuredMapper};
pub use importer::{Callbacks, CsvImporter, ImportHandle, ImportStatus, ImporterConfig};
pub use io::{ChunkedLineReader, ImportSource, StringLineSource};
pub use types::{
    Diagnostic, FieldList, ImportError, LineEnding, StructuredRecord, DIAGNOSTICS_TARGET,
};
