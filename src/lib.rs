// src/lib.rs
//! Turns SEC filing documents (HTML or PDF) into plain-text reports of the
//! sections that matter for analysis.

pub mod config;
pub mod edgar;
pub mod extractors;
pub mod pdf;
pub mod report;
pub mod storage;
pub mod utils;

use config::SectionConfig;
use extractors::{ExtractionResult, ItemMap, SectionExtractor, TableFormat};
use utils::error::ExtractError;

pub use pdf::extract_pdf;
pub use report::assemble as assemble_report;

/// Extracts the section introduced by any of `patterns` and ended by any of
/// `stop_patterns` from one HTML document.
pub fn extract_html_section(
    html: &str,
    patterns: &[String],
    stop_patterns: &[String],
) -> Result<ExtractionResult, ExtractError> {
    let section = SectionConfig {
        name: patterns.first().cloned().unwrap_or_default(),
        patterns: patterns.to_vec(),
        stop_patterns: stop_patterns.to_vec(),
    };
    let extractor = SectionExtractor::new(&[section], TableFormat::default())?;
    Ok(extractor.extract_sections(html))
}

/// Item-segmented form of [`extract_html_section`], for current reports.
pub fn extract_html_items(html: &str) -> Result<ItemMap, ExtractError> {
    let document = scraper::Html::parse_document(html);
    extractors::items::segment_document(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractorConfig, FetchConfig};
    use crate::edgar::EdgarClient;
    use crate::report::{ReportEntry, ReportSource};

    #[test]
    fn section_by_patterns() {
        let html = r##"<body>
            <p><a href="#risk">Risk Factors</a></p>
            <div id="risk">Item 1A. Risk Factors</div>
            <p>Competition is intense.</p>
            <div id="next">Item 1B. Unresolved Staff Comments</div>
            <p><a href="#next">Unresolved Staff Comments</a></p>
        </body>"##;
        let result = extract_html_section(
            html,
            &["risk factors".to_string()],
            &["unresolved staff comments".to_string()],
        )
        .unwrap();
        assert_eq!(
            result.get("Risk Factors"),
            Some("Item 1A. Risk Factors\nCompetition is intense.")
        );
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = extract_html_section("<p></p>", &["item (7".to_string()], &[]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidPattern { .. }));
    }

    #[test]
    fn items_need_a_marker() {
        let err = extract_html_items("<body><p>Item 8.01 Other Events</p></body>").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn report_from_entries() {
        let text = assemble_report(&[ReportEntry::success("Uploaded File: a.pdf", "Page 1:\nx")]);
        assert_eq!(text, "Uploaded File: a.pdf\n\nPage 1:\nx\n\n");
    }

    #[test]
    fn blocking_batch_over_uploads() {
        let client = EdgarClient::new(&FetchConfig::default()).unwrap();
        let sources = vec![ReportSource::Upload {
            file_name: "scan.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }];
        let report =
            tokio_test::block_on(report::analyze(&client, &ExtractorConfig::default(), sources)).unwrap();
        assert_eq!(
            report,
            "Uploaded File: scan.png failed to analyze. Error: Unsupported content: document is not a PDF\n\n"
        );
    }
}
