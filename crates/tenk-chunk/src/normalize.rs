//! Line-ending and blank-line canonicalisation.

use once_cell::sync::Lazy;
use regex::Regex;

static BLANK_LINE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));

/// Canonicalise raw section text.
///
/// CRLF becomes LF, runs of three or more newlines collapse to one blank
/// line, and surrounding whitespace is trimmed.
pub fn normalize(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    BLANK_LINE_RUNS.replace_all(&unix, "\n\n").trim().to_string()
}
