// src/extractors/patterns.rs
use crate::utils::error::ExtractError;
use regex::Regex;

/// Collapses every whitespace run (including non-breaking spaces) to a
/// single space and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, whitespace-collapsed text with typographic apostrophes
/// folded to `'`. Both patterns and document text go through this.
pub fn normalize(text: &str) -> String {
    fold_quotes(&collapse_whitespace(text).to_lowercase())
}

fn fold_quotes(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}', '\u{02BC}'], "'")
}

/// Section label as shown in output: whitespace collapsed and apostrophes
/// folded, case kept. A section gets the same name whichever way it was found.
pub fn display_label(text: &str) -> String {
    fold_quotes(&collapse_whitespace(text))
}

/// One alias for a section label.
///
/// The raw form is kept for substring matching against link text; the
/// compiled form is used where a regular expression match is required.
#[derive(Debug, Clone)]
pub struct AnchorPattern {
    raw: String,
    regex: Regex,
}

impl AnchorPattern {
    pub fn new(pattern: &str) -> Result<Self, ExtractError> {
        let raw = normalize(pattern);
        // Case is handled by the flag; lowercasing would turn `\D` into `\d`.
        let source = fold_quotes(&collapse_whitespace(pattern));
        let regex = Regex::new(&format!("(?i){}", source)).map_err(|e| ExtractError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { raw, regex })
    }

    pub fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Self>, ExtractError> {
        patterns.iter().map(|p| Self::new(p.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Substring or regex match; `normalized` must already be normalized.
    pub fn matches(&self, normalized: &str) -> bool {
        normalized.contains(&self.raw) || self.regex.is_match(normalized)
    }

    /// Regex-only match, as used when scanning headings.
    pub fn is_match(&self, normalized: &str) -> bool {
        self.regex.is_match(normalized)
    }
}

pub fn any_matches(patterns: &[AnchorPattern], normalized: &str) -> bool {
    patterns.iter().any(|p| p.matches(normalized))
}
