// src/extractors/items.rs
//! Item segmentation for current reports (8-K), whose disclosures are
//! numbered "Item N.NN" rather than named.

use crate::extractors::patterns::collapse_whitespace;
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static ITEM_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Item\s+\d+\.\d+").expect("Failed to compile ITEM_LABEL_RE")
});

static PAGE_BREAK_HR_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"hr[style*="page-break-after"]"#).expect("Failed to compile PAGE_BREAK_HR_SELECTOR")
});

static PAGE_BREAK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[style*="page-break-after"]"#).expect("Failed to compile PAGE_BREAK_SELECTOR")
});

const SIGNATURES: &str = "SIGNATURES";

/// Item key -> bullet lines, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMap {
    entries: Vec<(String, Vec<String>)>,
}

impl ItemMap {
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, lines)| lines.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `"<key>\n- line\n- line"` blocks separated by blank lines.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(key, lines)| {
                if lines.is_empty() {
                    key.clone()
                } else {
                    format!("{}\n- {}", key, lines.join("\n- "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Index of `key`, creating it when new. A repeated label keeps
    /// collecting under the existing key.
    fn open(&mut self, key: String) -> usize {
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key, Vec::new()));
                self.entries.len() - 1
            }
        }
    }
}

/// The currently open item while segmenting.
#[derive(Default)]
struct SegmentState {
    current: Option<usize>,
    items: ItemMap,
}

impl SegmentState {
    fn feed(&mut self, text: &str) {
        if let Some(label) = ITEM_LABEL_RE.find(text) {
            let rest = format!("{}{}", &text[..label.start()], &text[label.end()..]);
            let title = collapse_whitespace(&rest);
            let title = title.trim_start_matches(['.', ':', '-', '\u{2013}', '\u{2014}']).trim();
            let label = collapse_whitespace(label.as_str());
            let key = if title.is_empty() { label } else { format!("{} - {}", label, title) };
            self.current = Some(self.items.open(key));
        } else if let Some(idx) = self.current {
            let line = collapse_whitespace(text);
            if !line.is_empty() {
                self.items.entries[idx].1.push(line);
            }
        }
    }
}

/// Splits element texts into items. Text before the first item label is
/// dropped; nothing from "SIGNATURES" onward is considered.
pub fn segment<I, S>(texts: I) -> ItemMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut state = SegmentState::default();
    for text in texts {
        let text = text.as_ref().trim();
        if text == SIGNATURES {
            break;
        }
        state.feed(text);
    }
    state.items
}

/// First page-break marker, after which the report body starts.
fn body_marker(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&PAGE_BREAK_HR_SELECTOR)
        .next()
        .or_else(|| {
            tracing::debug!("No page-break <hr>, trying any page-break element");
            document.select(&PAGE_BREAK_SELECTOR).next()
        })
}

/// Segments a parsed 8-K: the elements following the cover page break.
pub fn segment_document(document: &Html) -> Result<ItemMap, ExtractError> {
    let marker = body_marker(document)
        .ok_or_else(|| ExtractError::SectionNotFound("no page-break marker before report items".to_string()))?;

    let texts = marker
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .map(|el| el.text().collect::<String>());
    let items = segment(texts);

    if items.is_empty() {
        return Err(ExtractError::SectionNotFound("no 'Item N.NN' labels after the cover page".to_string()));
    }
    tracing::debug!("Segmented {} items", items.len());
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_until_signatures() {
        let items = segment(["Item 2.02 Results", "Revenue grew 5%.", "SIGNATURES", "Item 9.01 Exhibits"]);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items.get("Item 2.02 - Results"),
            Some(&["Revenue grew 5%.".to_string()][..])
        );
    }

    #[test]
    fn only_the_exact_signatures_heading_ends_the_region() {
        let items = segment([
            "Item 8.01 Other Events",
            "Signatures of the parties are on file.",
            "  SIGNATURES  ",
            "After the end.",
        ]);
        assert_eq!(
            items.get("Item 8.01 - Other Events"),
            Some(&["Signatures of the parties are on file.".to_string()][..])
        );

        let items = segment(["Item 8.01 Other Events", "Signatures", "Still item 8.01."]);
        assert_eq!(
            items.get("Item 8.01 - Other Events"),
            Some(&["Signatures".to_string(), "Still item 8.01.".to_string()][..])
        );
    }

    #[test]
    fn drops_preamble_and_collapses_whitespace() {
        let items = segment([
            "UNITED STATES SECURITIES AND EXCHANGE COMMISSION",
            "Item 5.02.   Departure of Directors",
            "On March 1,\n  the Board   appointed a director.",
            "",
            "Item 9.01 Financial Statements and Exhibits",
            "99.1 Press release",
        ]);
        assert_eq!(
            items.keys().collect::<Vec<_>>(),
            vec!["Item 5.02 - Departure of Directors", "Item 9.01 - Financial Statements and Exhibits"]
        );
        assert_eq!(
            items.render(),
            "Item 5.02 - Departure of Directors\n- On March 1, the Board appointed a director.\n\nItem 9.01 - Financial Statements and Exhibits\n- 99.1 Press release"
        );
    }

    #[test]
    fn segments_document_after_page_break() {
        let html = Html::parse_document(
            r#"<body>
              <div>
                <p>Cover page</p>
                <hr style="page-break-after:always"/>
                <p>Item 2.02 Results of Operations and Financial Condition.</p>
                <p>On May 2, the Company announced results.</p>
                <p>Item 9.01 Financial Statements and Exhibits.</p>
                <table><tr><td>99.1</td><td>Press release</td></tr></table>
                <p>SIGNATURES</p>
                <p>Pursuant to the requirements...</p>
              </div>
            </body>"#,
        );
        let items = segment_document(&html).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items.get("Item 2.02 - Results of Operations and Financial Condition."),
            Some(&["On May 2, the Company announced results.".to_string()][..])
        );
        assert_eq!(
            items.get("Item 9.01 - Financial Statements and Exhibits."),
            Some(&["99.1Press release".to_string()][..])
        );
    }

    #[test]
    fn missing_marker_is_not_found() {
        let html = Html::parse_document("<body><p>Item 2.02 Results</p></body>");
        assert!(matches!(segment_document(&html), Err(ExtractError::SectionNotFound(_))));
    }
}
