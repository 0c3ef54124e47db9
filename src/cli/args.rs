use crate::importer::ImporterConfig;
use crate::types::{ImportError, LineEnding};
use clap::{Parser, ValueEnum};

/// Import a delimited text file and print it as normalized CSV
#[derive(Parser, Debug)]
#[command(name = "csv-import")]
#[command(about = "Import a delimited text file and print it as normalized CSV", long_about = None)]
pub struct CliArgs {
    /// Path or file:// URL of the file to import
    #[arg(value_name = "INPUT", help = "Path or file:// URL of the input file")]
    pub input: String,

    /// Field delimiter
    #[arg(
        short = 'd',
        long = "delimiter",
        value_name = "DELIMITER",
        default_value = ",",
        help = "Field delimiter, any non-empty string (use $'\\t' for tabs)"
    )]
    pub delimiter: String,

    /// Line terminator
    #[arg(
        long = "line-ending",
        value_name = "LINE_ENDING",
        default_value = "auto",
        help = "Line terminator: 'auto' detects it from the start of the file"
    )]
    pub line_ending: LineEndingArg,

    /// Text encoding label
    #[arg(
        short = 'e',
        long = "encoding",
        value_name = "LABEL",
        default_value = "utf-8",
        help = "Encoding label, e.g. utf-8, utf-16le, windows-1252"
    )]
    pub encoding: String,

    /// Bytes per read
    #[arg(
        long = "chunk-size",
        value_name = "BYTES",
        help = "Bytes requested from the file per read (default: 4096)"
    )]
    pub chunk_size: Option<usize>,

    /// Treat the first line as header
    #[arg(long = "header", help = "Treat the first line as header and skip lines that do not match it")]
    pub header: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help = "Log debug output to stderr")]
    pub verbose: bool,
}

/// Line terminator choices on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LineEndingArg {
    Auto,
    Lf,
    Cr,
    Crlf,
}

impl From<LineEndingArg> for LineEnding {
    fn from(arg: LineEndingArg) -> Self {
        match arg {
            LineEndingArg::Auto => LineEnding::Unknown,
            LineEndingArg::Lf => LineEnding::Lf,
            LineEndingArg::Cr => LineEnding::Cr,
            LineEndingArg::Crlf => LineEnding::CrLf,
        }
    }
}

impl CliArgs {
    /// Build an ImporterConfig from CLI arguments
    ///
    /// A missing or zero chunk size falls back to the default, with a warning
    /// for zero.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unknown encoding label.
    pub fn to_importer_config(&self) -> Result<ImporterConfig, ImportError> {
        let default = ImporterConfig::default();
        let chunk_size = match self.chunk_size {
            Some(0) => {
                tracing::warn!(
                    "Invalid chunk size (0), using default ({})",
                    default.chunk_size
                );
                default.chunk_size
            }
            Some(size) => size,
            None => default.chunk_size,
        };

        default
            .with_delimiter(self.delimiter.as_str())
            .with_line_ending(self.line_ending.into())
            .with_chunk_size(chunk_size)
            .with_encoding_label(&self.encoding)
    }

    /// Whether INPUT is a URL rather than a path
    pub fn input_is_url(&self) -> bool {
        self.input.starts_with("file:") || self.input.contains("://")
    }
}
