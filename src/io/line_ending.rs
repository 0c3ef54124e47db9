//! Line terminator sniffing
//!
//! Detection checks `\r\n` before `\n` before `\r`. The order matters: every CRLF
//! file also contains LF and CR, so testing LF first would misclassify it.

use crate::types::LineEnding;
use encoding_rs::Encoding;

/// Number of bytes inspected when sniffing a stream.
pub const DETECTION_WINDOW: usize = 4096;

/// Detect the terminator used in a text sample, defaulting to LF.
///
/// Never returns [`LineEnding::Unknown`]. A sample without any terminator (a
/// single-line file) resolves to LF.
pub fn detect_in_text(text: &str) -> LineEnding {
    if text.contains(LineEnding::CrLf.as_str()) {
        LineEnding::CrLf
    } else if text.contains(LineEnding::Lf.as_str()) {
        LineEnding::Lf
    } else if text.contains(LineEnding::Cr.as_str()) {
        LineEnding::Cr
    } else {
        LineEnding::Lf
    }
}

/// Detect the terminator in a raw byte prefix read in `encoding`.
///
/// The prefix is decoded leniently: a multi-byte character cut off by the end of
/// the window turns into U+FFFD instead of hiding the terminators before it.
pub fn detect_line_ending(prefix: &[u8], encoding: &'static Encoding) -> LineEnding {
    let window = &prefix[..prefix.len().min(DETECTION_WINDOW)];
    let (text, _) = encoding.decode_with_bom_removal(window);
    detect_in_text(&text)
}
