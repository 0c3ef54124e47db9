//! I/O module
//!
//! Turns byte sources into lines.
//!
//! # Components
//!
//! - `line_ending` - Terminator sniffing over a sample
//! - `chunked_reader` - Streaming reader that buffers fixed-size chunks into lines
//! - `string_source` - Eager splitter for content already in memory
//! - `source` - Source selection (path, file URL, text) and the uniform line iterator

pub mod chunked_reader;
pub mod line_ending;
pub mod source;
pub mod string_source;

pub use chunked_reader::{ChunkedLineReader, LineError, DEFAULT_CHUNK_SIZE};
pub use line_ending::{detect_in_text, detect_line_ending, DETECTION_WINDOW};
pub use source::{ImportSource, Lines};
pub use string_source::StringLineSource;
