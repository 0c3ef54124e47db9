//! Source selection
//!
//! An importer reads from exactly one of: a filesystem path (streamed through
//! [`ChunkedLineReader`]) or an in-memory string (split by [`StringLineSource`]).
//! File URLs resolve to paths at construction; any other URL is rejected there,
//! before a run is ever started.

use crate::io::chunked_reader::{ChunkedLineReader, LineError};
use crate::io::string_source::StringLineSource;
use crate::types::{ImportError, LineEnding};
use encoding_rs::Encoding;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Where an importer reads its data from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSource {
    /// A file on the local filesystem, opened fresh for every run
    Path(PathBuf),
    /// Text already in memory, shared between runs
    Text(Arc<str>),
}

impl ImportSource {
    pub fn path(path: impl AsRef<Path>) -> Self {
        ImportSource::Path(path.as_ref().to_path_buf())
    }

    pub fn text(content: impl Into<Arc<str>>) -> Self {
        ImportSource::Text(content.into())
    }

    /// Resolve a URL to a local file source
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `url` does not parse
    /// - `UnsupportedUrl` if it is not a `file://` URL naming a local path
    pub fn from_url(url: &str) -> Result<Self, ImportError> {
        let parsed = Url::parse(url).map_err(|e| ImportError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "file" {
            return Err(ImportError::UnsupportedUrl {
                url: url.to_string(),
            });
        }

        parsed
            .to_file_path()
            .map(ImportSource::Path)
            .map_err(|_| ImportError::UnsupportedUrl {
                url: url.to_string(),
            })
    }

    /// Open the source and return its lines
    ///
    /// Only the path variant can fail here; the file handle then belongs to the
    /// returned [`Lines`] and is closed with it.
    pub fn open_lines(
        &self,
        line_ending: LineEnding,
        encoding: &'static Encoding,
        chunk_size: usize,
    ) -> Result<Lines, ImportError> {
        match self {
            ImportSource::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    ImportError::source_unavailable(&path.display().to_string(), &e)
                })?;
                tracing::debug!(path = %path.display(), %line_ending, encoding = encoding.name(), "opened source");
                Ok(Lines::File(ChunkedLineReader::new(
                    file,
                    line_ending,
                    encoding,
                    chunk_size,
                )))
            }
            ImportSource::Text(content) => {
                let source = StringLineSource::new(content, line_ending);
                tracing::debug!(lines = source.len(), line_ending = %source.line_ending(), "split text source");
                Ok(Lines::Text {
                    line_ending: source.line_ending(),
                    lines: source.into_iter(),
                })
            }
        }
    }
}

/// Lines of an opened source
#[derive(Debug)]
pub enum Lines {
    File(ChunkedLineReader<File>),
    Text {
        lines: std::vec::IntoIter<String>,
        line_ending: LineEnding,
    },
}

impl Lines {
    /// The terminator splitting these lines, once known
    pub fn line_ending(&self) -> Option<LineEnding> {
        match self {
            Lines::File(reader) => Some(reader.line_ending()).filter(|le| le.is_resolved()),
            Lines::Text { line_ending, .. } => Some(*line_ending),
        }
    }
}

impl Iterator for Lines {
    type Item = Result<String, LineError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Lines::File(reader) => reader.next(),
            Lines::Text { lines, .. } => lines.next().map(Ok),
        }
    }
}
