//! Whitespace normalisation applied to every extraction.

use regex::Regex;
use std::sync::OnceLock;

fn blank_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// CRLF to LF, collapse three or more newlines into one blank line, trim.
pub fn normalize_whitespace(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    blank_runs().replace_all(&unix, "\n\n").trim().to_string()
}
