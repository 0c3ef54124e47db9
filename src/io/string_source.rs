//! In-memory line source
//!
//! The content is already resident, so the split happens eagerly and the lines
//! can be iterated any number of times. The result matches what
//! [`ChunkedLineReader`](crate::io::ChunkedLineReader) yields for the same text:
//! an empty string has no lines and a final terminator does not open an extra
//! empty line.

use crate::io::line_ending::detect_in_text;
use crate::types::LineEnding;

/// Eagerly split lines of an in-memory string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLineSource {
    lines: Vec<String>,
    line_ending: LineEnding,
}

impl StringLineSource {
    /// Split `content` by `line_ending`, detecting it from the whole string when
    /// `Unknown`.
    pub fn new(content: &str, line_ending: LineEnding) -> Self {
        let line_ending = if line_ending.is_resolved() {
            line_ending
        } else {
            detect_in_text(content)
        };

        let terminator = line_ending.as_str();
        let body = content.strip_suffix(terminator).unwrap_or(content);
        let lines = if content.is_empty() {
            Vec::new()
        } else {
            body.split(terminator).map(str::to_owned).collect()
        };

        Self { lines, line_ending }
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }
}

impl IntoIterator for StringLineSource {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

impl<'a> IntoIterator for &'a StringLineSource {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
