//! Field splitting with RFC 4180-style dequoting
//!
//! A field that contains the delimiter or a quote is wrapped in quotes, and quotes
//! inside it are doubled. Splitting on the delimiter first and repairing the damage
//! afterwards keeps the common unquoted case to a single `split`:
//!
//! 1. `<d>""<d>` (an empty quoted field) collapses to `<d><d>`
//! 2. a leading `""<d>` and a trailing `<d>""` lose their quotes
//! 3. every remaining `""` is parked as U+001A so it survives the quote handling
//! 4. the line is split on the delimiter
//! 5. a piece that opens a quote without closing it is re-joined with the
//!    following pieces up to the one that closes it, using the delimiter as glue
//! 6. leftover quote characters are dropped and U+001A turns back into `"`
//!
//! When the closing piece never comes, the pieces stay unmerged and an
//! [`UnterminatedQuote`](crate::types::Diagnostic::UnterminatedQuote) diagnostic
//! is emitted. The line is still returned.

use crate::types::{Diagnostic, FieldList, ImportError, DIAGNOSTICS_TARGET};

const QUOTE: char = '"';
const ESCAPED_QUOTE: &str = "\"\"";
const SUBSTITUTE: char = '\u{1a}';

/// Splits lines into fields for one fixed delimiter
///
/// The delimiter-dependent escape sequences are built once at construction.
///
/// # Examples
///
/// ```
/// use csv_importer::core::FieldSplitter;
///
/// let splitter = FieldSplitter::new(",").unwrap();
/// assert_eq!(splitter.split(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
/// assert_eq!(splitter.split(r#""x""y",z"#), vec!["x\"y", "z"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSplitter {
    delimiter: String,
    delimiter_quote_delimiter: String,
    delimiter_delimiter: String,
    quote_delimiter: String,
    delimiter_quote: String,
}

impl FieldSplitter {
    /// Create a splitter for `delimiter`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the delimiter is empty.
    pub fn new(delimiter: &str) -> Result<Self, ImportError> {
        if delimiter.is_empty() {
            return Err(ImportError::invalid_config("delimiter must not be empty"));
        }

        Ok(Self {
            delimiter: delimiter.to_string(),
            delimiter_quote_delimiter: format!("{delimiter}{ESCAPED_QUOTE}{delimiter}"),
            delimiter_delimiter: format!("{delimiter}{delimiter}"),
            quote_delimiter: format!("{ESCAPED_QUOTE}{delimiter}"),
            delimiter_quote: format!("{delimiter}{ESCAPED_QUOTE}"),
        })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Split one line into its fields
    ///
    /// An unterminated quote is reported as a warning that quotes the line text.
    pub fn split(&self, line: &str) -> FieldList {
        let (fields, unterminated) = self.dequote(line);
        if unterminated {
            tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                kind = "unterminated_quote",
                line_text = line,
                "opening quote is never closed; fields left unmerged"
            );
        }
        fields
    }

    /// Split line number `line_number` (1-based) of a source
    ///
    /// Same as [`split`](Self::split) but reports an unterminated quote as a
    /// numbered [`Diagnostic`].
    pub fn split_line(&self, line_number: usize, line: &str) -> FieldList {
        let (fields, unterminated) = self.dequote(line);
        if unterminated {
            Diagnostic::UnterminatedQuote { line: line_number }.emit();
        }
        fields
    }

    /// Returns the fields and whether a quote was left open
    fn dequote(&self, line: &str) -> (FieldList, bool) {
        // A bare `""` is one empty quoted field, not an escaped quote character.
        if line == ESCAPED_QUOTE {
            return (vec![String::new()], false);
        }

        let mut corrected = line.to_string();
        while corrected.contains(&self.delimiter_quote_delimiter) {
            corrected = corrected.replace(&self.delimiter_quote_delimiter, &self.delimiter_delimiter);
        }

        if corrected.starts_with(&self.quote_delimiter) {
            corrected.replace_range(..ESCAPED_QUOTE.len(), "");
        }

        if corrected.ends_with(&self.delimiter_quote) {
            corrected.truncate(corrected.len() - ESCAPED_QUOTE.len());
        }

        let corrected = corrected.replace(ESCAPED_QUOTE, &SUBSTITUTE.to_string());
        let mut components: Vec<String> = corrected
            .split(self.delimiter.as_str())
            .map(str::to_owned)
            .collect();

        let mut unterminated = false;
        let mut index = 0;
        while index < components.len() {
            if opens_quote(&components[index]) {
                let mut end = index + 1;
                while end < components.len() && !components[end].contains(QUOTE) {
                    end += 1;
                }

                if end < components.len() && closes_quote(&components[end]) {
                    let merged = components[index..=end].join(&self.delimiter);
                    components.splice(index..=end, std::iter::once(merged));
                } else {
                    unterminated = true;
                }
            }
            index += 1;
        }

        let fields = components
            .into_iter()
            .map(|component| {
                component
                    .replace(QUOTE, "")
                    .replace(SUBSTITUTE, "\"")
            })
            .collect();

        (fields, unterminated)
    }
}

/// `^"[^"]*$`: starts a quoted field that continues past this piece
fn opens_quote(component: &str) -> bool {
    component
        .strip_prefix(QUOTE)
        .is_some_and(|rest| !rest.contains(QUOTE))
}

/// `^[^"]*"$`: ends a quoted field that started in an earlier piece
fn closes_quote(component: &str) -> bool {
    component
        .strip_suffix(QUOTE)
        .is_some_and(|rest| !rest.contains(QUOTE))
}
