//! The importer facade
//!
//! A [`CsvImporter`] pairs one source with one [`ImporterConfig`]. It is
//! read-only after construction: every run, blocking or background, builds its
//! own [`ImportRun`](run::ImportRun), so one importer can serve any number of
//! runs, also concurrently.
//!
//! # Entry points
//!
//! | | blocking | background |
//! |---|---|---|
//! | fields | [`import_records`](CsvImporter::import_records) | [`start`](CsvImporter::start) |
//! | header-keyed | [`import_structured`](CsvImporter::import_structured) | [`start_structured`](CsvImporter::start_structured) |
//!
//! # Configuration
//!
//! Invalid settings are rejected when the importer is built, never during a
//! run:
//! - the delimiter must be non-empty
//! - the chunk size must be positive
//! - a URL must be a `file://` URL of a local path

pub mod r#async;
pub mod run;
pub mod sync;

pub use self::r#async::{Callbacks, ImportHandle, ImportStatus};
pub use run::{ImportRun, RunOutcome, PROGRESS_INTERVAL};

use crate::core::FieldSplitter;
use crate::io::{ImportSource, Lines, DEFAULT_CHUNK_SIZE};
use crate::types::{ImportError, LineEnding};
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Settings shared by every run of an importer
///
/// # Examples
///
/// ```
/// use csv_importer::{ImporterConfig, LineEnding};
///
/// let config = ImporterConfig::default()
///     .with_delimiter(";")
///     .with_line_ending(LineEnding::CrLf)
///     .with_chunk_size(64 * 1024);
/// assert_eq!(config.delimiter, ";");
/// ```
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Field separator, any non-empty string
    pub delimiter: String,
    /// Line terminator; `Unknown` detects it from the start of the source
    pub line_ending: LineEnding,
    /// Encoding of file sources
    pub encoding: &'static Encoding,
    /// Bytes requested from a file per read
    pub chunk_size: usize,
    /// Runtime whose blocking pool runs background scans
    pub work_runtime: Option<Handle>,
    /// Runtime on which background callbacks run
    pub callback_runtime: Option<Handle>,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            line_ending: LineEnding::Unknown,
            encoding: UTF_8,
            chunk_size: DEFAULT_CHUNK_SIZE,
            work_runtime: None,
            callback_runtime: None,
        }
    }
}

impl ImporterConfig {
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the encoding by its WHATWG label (`"utf-8"`, `"utf-16le"`,
    /// `"windows-1252"`, ...)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown label.
    pub fn with_encoding_label(self, label: &str) -> Result<Self, ImportError> {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            ImportError::invalid_config(format!("unknown encoding label '{}'", label))
        })?;
        Ok(self.with_encoding(encoding))
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_work_runtime(mut self, handle: Handle) -> Self {
        self.work_runtime = Some(handle);
        self
    }

    pub fn with_callback_runtime(mut self, handle: Handle) -> Self {
        self.callback_runtime = Some(handle);
        self
    }
}

/// A configured CSV source
#[derive(Debug, Clone)]
pub struct CsvImporter {
    source: ImportSource,
    splitter: FieldSplitter,
    line_ending: LineEnding,
    encoding: &'static Encoding,
    chunk_size: usize,
    work_runtime: Option<Handle>,
    callback_runtime: Option<Handle>,
}

impl CsvImporter {
    /// Create an importer for `source`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an empty delimiter or a zero chunk size.
    pub fn new(source: ImportSource, config: ImporterConfig) -> Result<Self, ImportError> {
        if config.chunk_size == 0 {
            return Err(ImportError::invalid_config("chunk size must be positive"));
        }
        let splitter = FieldSplitter::new(&config.delimiter)?;

        Ok(Self {
            source,
            splitter,
            line_ending: config.line_ending,
            encoding: config.encoding,
            chunk_size: config.chunk_size,
            work_runtime: config.work_runtime,
            callback_runtime: config.callback_runtime,
        })
    }

    /// Import from a file
    ///
    /// The file is opened when a run starts, so a missing file is reported by
    /// the run, not here.
    pub fn from_path(path: impl AsRef<Path>, config: ImporterConfig) -> Result<Self, ImportError> {
        Self::new(ImportSource::path(path), config)
    }

    /// Import from a `file://` URL
    ///
    /// # Errors
    ///
    /// `InvalidUrl` or `UnsupportedUrl` for anything but a local file URL, on
    /// top of the configuration errors of [`new`](Self::new).
    pub fn from_url(url: &str, config: ImporterConfig) -> Result<Self, ImportError> {
        Self::new(ImportSource::from_url(url)?, config)
    }

    /// Import from text already in memory
    ///
    /// The configured encoding and chunk size do not apply.
    pub fn from_text(text: impl Into<Arc<str>>, config: ImporterConfig) -> Result<Self, ImportError> {
        Self::new(ImportSource::text(text), config)
    }

    pub fn source(&self) -> &ImportSource {
        &self.source
    }

    pub fn delimiter(&self) -> &str {
        self.splitter.delimiter()
    }

    /// The configured line ending; `Unknown` means it is detected per run
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub(crate) fn splitter(&self) -> &FieldSplitter {
        &self.splitter
    }

    pub(crate) fn work_runtime(&self) -> Option<&Handle> {
        self.work_runtime.as_ref()
    }

    pub(crate) fn callback_runtime(&self) -> Option<&Handle> {
        self.callback_runtime.as_ref()
    }

    pub(crate) fn open_lines(&self) -> Result<Lines, ImportError> {
        self.source
            .open_lines(self.line_ending, self.encoding, self.chunk_size)
    }
}
