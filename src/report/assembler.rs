//! Merges per-document results into one ordered text bundle.

use std::fmt;

/// Result of processing one filing or uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub label: String,
    pub outcome: Result<String, String>,
}

impl ReportEntry {
    pub fn success(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self { label: label.into(), outcome: Ok(content.into()) }
    }

    pub fn failure(label: impl Into<String>, error: impl fmt::Display) -> Self {
        Self { label: label.into(), outcome: Err(error.to_string()) }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// This entry's block of the report.
    pub fn render(&self) -> String {
        match &self.outcome {
            Ok(content) => format!("{}\n\n{}\n\n", self.label, content),
            Err(message) => format!("{} failed to analyze. Error: {}\n\n", self.label, message),
        }
    }
}

/// Concatenates entries in input order. A failed entry becomes a one-line
/// note and never affects the others.
pub fn assemble(entries: &[ReportEntry]) -> String {
    let failed = entries.iter().filter(|e| !e.is_success()).count();
    if failed > 0 {
        tracing::warn!("{} of {} documents failed to analyze", failed, entries.len());
    }
    entries.iter().map(ReportEntry::render).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_success_and_failure() {
        let entries = vec![
            ReportEntry::success("Filing: 10-K (2024-11-01)", "MD&A text"),
            ReportEntry::failure("Filing: 8-K (2024-10-31)", "Network request failed: timeout"),
        ];
        assert_eq!(
            assemble(&entries),
            "Filing: 10-K (2024-11-01)\n\nMD&A text\n\n\
             Filing: 8-K (2024-10-31) failed to analyze. Error: Network request failed: timeout\n\n"
        );
    }

    #[test]
    fn failure_leaves_neighbours_untouched() {
        let first = ReportEntry::success("Uploaded File: a.pdf", "Page 1:\nalpha");
        let broken = ReportEntry::failure("Uploaded File: b.pdf", "Unsupported content: document is not a PDF");
        let third = ReportEntry::success("Uploaded File: c.pdf", "Page 1:\ngamma");

        let combined = assemble(&[first.clone(), broken.clone(), third.clone()]);
        let expected = format!(
            "{}{}{}",
            assemble(&[first]),
            assemble(&[broken]),
            assemble(&[third])
        );
        assert_eq!(combined, expected);
    }

    #[test]
    fn empty_input_gives_empty_report() {
        assert_eq!(assemble(&[]), "");
    }
}
