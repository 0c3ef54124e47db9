//! Line terminator selection

use std::fmt;

/// The line terminator separating records in a source.
///
/// `Unknown` asks the line source to sniff the terminator from the data itself.
/// Once a run has resolved its terminator it never changes for that run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineEnding {
    /// `"\r"`
    Cr,
    /// `"\n"`
    Lf,
    /// `"\r\n"`
    CrLf,
    /// Detect from the data
    #[default]
    Unknown,
}

impl LineEnding {
    /// The terminator as text. `Unknown` has no terminator and returns `""`.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Cr => "\r",
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Unknown => "",
        }
    }

    pub fn is_resolved(self) -> bool {
        self != LineEnding::Unknown
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineEnding::Cr => "CR",
            LineEnding::Lf => "LF",
            LineEnding::CrLf => "CRLF",
            LineEnding::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
