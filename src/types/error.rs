//! Error and diagnostic types for the CSV importer
//!
//! Two families live here:
//!
//! - [`ImportError`]: problems that stop a run (or stop an importer from being
//!   built). A failed run delivers no partial records.
//! - [`Diagnostic`]: per-line anomalies that are recovered locally. The line is
//!   skipped or emitted best-effort and the run continues.
//!
//! Diagnostics are published as `tracing` events under [`DIAGNOSTICS_TARGET`] so
//! an embedding application can route, count or silence them with its own
//! subscriber.

use thiserror::Error;

/// Tracing target used for per-line diagnostics.
pub const DIAGNOSTICS_TARGET: &str = "csv_importer::diagnostics";

/// Fatal errors of the importer
///
/// Every variant carries owned strings so the error can be cloned into
/// callbacks and compared in tests.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// The source could not be opened for reading
    ///
    /// Missing file, permission denied and similar.
    #[error("Source unavailable '{path}': {message}")]
    SourceUnavailable {
        /// Path that failed to open
        path: String,
        /// Underlying I/O error
        message: String,
    },

    /// The source failed while it was being read
    #[error("Read error: {message}")]
    Read {
        /// Description of the I/O error
        message: String,
    },

    /// A URL that does not point at a local file
    #[error("Unsupported URL '{url}': only local file URLs can be imported")]
    UnsupportedUrl {
        /// The rejected URL
        url: String,
    },

    /// A string that is not a URL at all
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl {
        /// The rejected input
        url: String,
        /// Parser error
        message: String,
    },

    /// Importer configuration that cannot work (empty delimiter, zero chunk size)
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration
        message: String,
    },

    /// A background import was started outside of a tokio runtime and no
    /// explicit runtime handle was configured
    #[error("No tokio runtime available to run the import")]
    NoRuntime,

    /// The worker stopped without reporting an outcome
    #[error("Import worker stopped without reporting a result")]
    WorkerAborted,
}

impl From<std::io::Error> for ImportError {
    fn from(error: std::io::Error) -> Self {
        ImportError::Read {
            message: error.to_string(),
        }
    }
}

impl ImportError {
    /// Create a SourceUnavailable error
    pub fn source_unavailable(path: &str, error: &std::io::Error) -> Self {
        ImportError::SourceUnavailable {
            path: path.to_string(),
            message: error.to_string(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ImportError::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Recoverable per-line anomalies
///
/// Line numbers are 1-based and count every physical line of the source,
/// including the header row and lines that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// A data line has a different field count than the header
    #[error("Line {line}: expected {expected} fields to match the header, found {actual}; line skipped")]
    StructureMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// A quoted field never closes within its line
    #[error("Line {line}: opening quote is never closed; fields left unmerged")]
    UnterminatedQuote { line: usize },

    /// The bytes of a line are not valid in the declared encoding
    #[error("Line {line}: bytes are not valid {encoding}; line skipped")]
    DecodeFailure { line: usize, encoding: String },
}

impl Diagnostic {
    /// Short stable name of the diagnostic kind
    pub fn kind(&self) -> &'static str {
        match self {
            Diagnostic::StructureMismatch { .. } => "structure_mismatch",
            Diagnostic::UnterminatedQuote { .. } => "unterminated_quote",
            Diagnostic::DecodeFailure { .. } => "decode_failure",
        }
    }

    /// Publish the diagnostic as a warning event
    ///
    /// The variant's fields are recorded as event fields next to `kind`.
    pub fn emit(&self) {
        match self {
            Diagnostic::StructureMismatch {
                line,
                expected,
                actual,
            } => tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                kind = self.kind(),
                line,
                expected,
                actual,
                "{}",
                self
            ),
            Diagnostic::UnterminatedQuote { line } => tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                kind = self.kind(),
                line,
                "{}",
                self
            ),
            Diagnostic::DecodeFailure { line, encoding } => tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                kind = self.kind(),
                line,
                encoding = %encoding,
                "{}",
                self
            ),
        }
    }
}
