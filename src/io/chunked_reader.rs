//! Chunked line reader with an iterator interface
//!
//! Streams decoded lines out of any [`Read`] source without loading the whole
//! source into memory.
//!
//! # Design
//!
//! The reader keeps one growing byte buffer. To produce a line it searches the
//! buffer for the encoded terminator; when the terminator is not there yet it
//! reads another chunk and appends it, until the terminator shows up or the
//! source runs dry. Whatever is left at the end of the source becomes a final,
//! unterminated line.
//!
//! Emitted lines only advance a `consumed` offset. The unread tail is moved to
//! the front once per chunk, right before the next read, so a chunk is copied
//! at most once however many lines it holds.
//!
//! Matching happens on bytes, before decoding, so the terminator is encoded in
//! the declared encoding and matches are only accepted at code-unit boundaries.
//! This keeps UTF-16 sources from matching a `\n` byte that is really half of an
//! unrelated character.
//!
//! # Line endings
//!
//! When constructed with [`LineEnding::Unknown`] the first chunk is sniffed with
//! [`detect_line_ending`] and stays in the buffer, so the source is read once.
//!
//! # Error Handling
//!
//! - Bytes that do not decode in the declared encoding yield `Err(LineError::Decode)`
//!   for that line only; the iterator keeps going.
//! - A read failure yields `Err(LineError::Io)` once and ends the iterator.
//!
//! The source is dropped as soon as it is exhausted or fails, and in any case
//! when the reader itself is dropped.

use crate::io::line_ending::{detect_line_ending, DETECTION_WINDOW};
use crate::types::LineEnding;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use std::io::{self, Read};
use thiserror::Error;

/// Default number of bytes requested from the source per read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Longest byte-order mark recognised by `encoding_rs`.
const BOM_MAX_LEN: usize = 3;

/// Problems producing a single line
#[derive(Debug, Error)]
pub enum LineError {
    /// The line's bytes are not valid in the declared encoding
    #[error("line is not valid {encoding}")]
    Decode { encoding: &'static str },

    /// Reading the source failed; no further lines follow
    #[error("failed to read source: {0}")]
    Io(#[from] io::Error),
}

/// Streaming line reader over a byte source
///
/// # Examples
///
/// ```
/// use csv_importer::io::ChunkedLineReader;
/// use csv_importer::LineEnding;
///
/// let data = "id,name\r\n1,Alice\r\n".as_bytes();
/// let reader = ChunkedLineReader::new(data, LineEnding::Unknown, encoding_rs::UTF_8, 4);
/// let lines: Vec<String> = reader.filter_map(Result::ok).collect();
/// assert_eq!(lines, vec!["id,name", "1,Alice"]);
/// ```
#[derive(Debug)]
pub struct ChunkedLineReader<R> {
    source: Option<R>,
    line_ending: LineEnding,
    encoding: &'static Encoding,
    chunk_size: usize,
    buffer: Vec<u8>,
    consumed: usize,
    terminator: Vec<u8>,
    unit: usize,
    search_from: usize,
    started: bool,
}

impl<R: Read> ChunkedLineReader<R> {
    /// Create a reader over `source`
    ///
    /// Nothing is read until the first line is requested. A `chunk_size` of zero
    /// is treated as [`DEFAULT_CHUNK_SIZE`].
    pub fn new(
        source: R,
        line_ending: LineEnding,
        encoding: &'static Encoding,
        chunk_size: usize,
    ) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };

        Self {
            source: Some(source),
            line_ending,
            encoding,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            consumed: 0,
            terminator: Vec::new(),
            unit: code_unit_width(encoding),
            search_from: 0,
            started: false,
        }
    }

    /// The terminator in use
    ///
    /// Still `Unknown` until the first line has been requested when detection
    /// was asked for.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Append up to `len` bytes from the source; returns the number appended.
    ///
    /// Zero means the source is exhausted and has been released.
    fn read_chunk(&mut self, len: usize) -> io::Result<usize> {
        let Some(source) = self.source.as_mut() else {
            return Ok(0);
        };

        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.search_from -= self.consumed;
            self.consumed = 0;
        }

        let read = match source.by_ref().take(len as u64).read_to_end(&mut self.buffer) {
            Ok(read) => read,
            Err(e) => {
                self.source = None;
                return Err(e);
            }
        };

        if read == 0 {
            self.source = None;
        }
        Ok(read)
    }

    /// Read the first chunk, drop a matching byte-order mark and fix the terminator.
    fn start(&mut self) -> io::Result<()> {
        self.started = true;
        let window = if self.line_ending.is_resolved() {
            self.chunk_size.max(BOM_MAX_LEN)
        } else {
            self.chunk_size.max(DETECTION_WINDOW)
        };
        self.read_chunk(window)?;

        if let Some((bom_encoding, bom_len)) = Encoding::for_bom(&self.buffer) {
            if bom_encoding == self.encoding {
                self.buffer.drain(..bom_len);
            }
        }

        if !self.line_ending.is_resolved() {
            self.line_ending = detect_line_ending(&self.buffer, self.encoding);
            tracing::debug!(line_ending = %self.line_ending, "detected line ending");
        }
        self.terminator = encode_terminator(self.line_ending.as_str(), self.encoding);
        Ok(())
    }

    /// Position of the next terminator, scanning aligned offsets only.
    ///
    /// Resumes where the previous unsuccessful scan stopped.
    fn find_terminator(&mut self) -> Option<usize> {
        let len = self.terminator.len();
        if len == 0 {
            return None;
        }
        let mut pos = self.search_from;
        while pos + len <= self.buffer.len() {
            if self.buffer[pos..pos + len] == self.terminator[..] {
                return Some(pos);
            }
            pos += self.unit;
        }
        self.search_from = pos;
        None
    }

    fn decode(&self, bytes: &[u8]) -> Result<String, LineError> {
        self.encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or(LineError::Decode {
                encoding: self.encoding.name(),
            })
    }

    /// Produce the next line, or `None` once the source is exhausted
    pub fn next_line(&mut self) -> Option<Result<String, LineError>> {
        if !self.started {
            if let Err(e) = self.start() {
                self.reset_buffer();
                return Some(Err(e.into()));
            }
        }

        loop {
            if let Some(pos) = self.find_terminator() {
                let line = self.decode(&self.buffer[self.consumed..pos]);
                self.consumed = pos + self.terminator.len();
                self.search_from = self.consumed;
                return Some(line);
            }

            match self.read_chunk(self.chunk_size) {
                Ok(0) => break,
                Ok(_) => continue,
                Err(e) => {
                    self.reset_buffer();
                    return Some(Err(e.into()));
                }
            }
        }

        if self.consumed == self.buffer.len() {
            self.reset_buffer();
            return None;
        }

        let rest = self.decode(&self.buffer[self.consumed..]);
        self.reset_buffer();
        Some(rest)
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();
        self.consumed = 0;
        self.search_from = 0;
    }
}

impl<R: Read> Iterator for ChunkedLineReader<R> {
    type Item = Result<String, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line()
    }
}

fn code_unit_width(encoding: &'static Encoding) -> usize {
    if encoding == UTF_16LE || encoding == UTF_16BE {
        2
    } else {
        1
    }
}

/// Encode an ASCII terminator in `encoding`.
///
/// Every encoding other than UTF-16 represents CR and LF as their ASCII bytes.
fn encode_terminator(terminator: &str, encoding: &'static Encoding) -> Vec<u8> {
    if encoding == UTF_16LE {
        terminator.encode_utf16().flat_map(u16::to_le_bytes).collect()
    } else if encoding == UTF_16BE {
        terminator.encode_utf16().flat_map(u16::to_be_bytes).collect()
    } else {
        terminator.as_bytes().to_vec()
    }
}
