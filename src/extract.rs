//! Best-effort reduction of an HTML fragment to hover text.
//!
//! This is a pattern-based stripper, not a parser: tags are removed wholesale,
//! `&nbsp;` becomes a space and runs of blank lines collapse to one.

use regex::Regex;
use std::sync::OnceLock;

static TAG_PATTERN: OnceLock<Regex> = OnceLock::new();
static BLANK_LINES_PATTERN: OnceLock<Regex> = OnceLock::new();

fn tag_pattern() -> &'static Regex {
    TAG_PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("invalid tag pattern"))
}

fn blank_lines_pattern() -> &'static Regex {
    BLANK_LINES_PATTERN
        .get_or_init(|| Regex::new(r"\n\s*\n").expect("invalid blank line pattern"))
}

/// Converts the inner markup of a content region into plain text.
pub fn extract(html_fragment: &str) -> String {
    let without_tags = tag_pattern().replace_all(html_fragment, "");
    let spaced = without_tags.replace("&nbsp;", " ");
    blank_lines_pattern()
        .replace_all(&spaced, "\n\n")
        .trim()
        .to_string()
}
