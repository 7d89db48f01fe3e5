// src/extractors/locator.rs
//! Finds where a named section starts (and where the next one starts) in a
//! filing's HTML.
//!
//! Two strategies, first success wins:
//! 1. internal links: the first `<a>` whose text matches a start alias
//!    gives the target id, the first matching a stop alias gives the stop id;
//! 2. heading text: the first heading or block element whose text matches a
//!    start alias (as a regex) is the start element itself.

use crate::extractors::patterns::{any_matches, display_label, normalize, AnchorPattern};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a").expect("Failed to compile LINK_SELECTOR")
});

static HEADING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, div").expect("Failed to compile HEADING_SELECTOR")
});

static ANCHOR_TARGET_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[id], a[name]").expect("Failed to compile ANCHOR_TARGET_SELECTOR")
});

// Selectors for potential ToC containers
static TOC_CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div[class*='toc'], nav[class*='toc'], div[id*='toc'], nav[id*='toc']")
        .expect("Failed to compile TOC_CONTAINER_SELECTOR")
});

/// Where a section begins or ends. `id` is set when the position came from
/// an internal link, `None` when the heading itself was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBoundary {
    pub id: Option<String>,
    pub name: String,
}

/// A resolved start element plus the optional stop boundary.
#[derive(Debug, Clone)]
pub struct LocatedSection<'a> {
    pub start: ElementRef<'a>,
    pub boundary: SectionBoundary,
    pub stop: Option<SectionBoundary>,
}

/// Target id of a link: the fragment after `#`, or the whole href when it
/// has none (such ids will not resolve).
fn link_target(href: &str) -> Option<String> {
    let target = href.rsplit('#').next().unwrap_or(href).trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// Label for a section found through a link: the text around the link
/// (its parent), unless that is only a page number.
fn link_label(link: ElementRef) -> String {
    let own = display_label(&link.text().collect::<String>());
    let parent = link
        .parent()
        .and_then(ElementRef::wrap)
        .map(|p| display_label(&p.text().collect::<String>()))
        .unwrap_or_default();

    if parent.is_empty() || parent.parse::<f64>().is_ok() {
        own
    } else {
        parent
    }
}

/// Strategy 1: scans links in document order. Only the first qualifying
/// link of each kind counts.
pub fn find_link_boundaries(
    document: &Html,
    patterns: &[AnchorPattern],
    stop_patterns: &[AnchorPattern],
) -> (Option<SectionBoundary>, Option<SectionBoundary>) {
    let mut start: Option<SectionBoundary> = None;
    let mut stop: Option<SectionBoundary> = None;

    for link in document.select(&LINK_SELECTOR) {
        if start.is_some() && stop.is_some() {
            break;
        }
        let Some(target) = link.value().attr("href").and_then(link_target) else {
            continue;
        };
        let text = normalize(&link.text().collect::<String>());
        if text.is_empty() || text.parse::<f64>().is_ok() {
            continue;
        }

        if start.is_none() && any_matches(patterns, &text) {
            tracing::debug!("Start link '{}' -> #{}", text, target);
            start = Some(SectionBoundary { id: Some(target.clone()), name: link_label(link) });
        }
        if stop.is_none() && any_matches(stop_patterns, &text) {
            tracing::debug!("Stop link '{}' -> #{}", text, target);
            stop = Some(SectionBoundary { id: Some(target), name: link_label(link) });
        }
    }

    (start, stop)
}

/// Element carrying `id` (or, for old-style anchors, `name`).
pub fn find_by_anchor<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let by_id = document
        .select(&ANCHOR_TARGET_SELECTOR)
        .find(|el| el.value().id() == Some(id));
    by_id.or_else(|| {
        document
            .select(&ANCHOR_TARGET_SELECTOR)
            .find(|el| el.value().attr("name") == Some(id))
    })
}

/// Checks if an element is likely within a Table of Contents using DOM structure.
fn is_in_toc(element: ElementRef) -> bool {
    for ancestor in element.ancestors().filter_map(ElementRef::wrap) {
        if TOC_CONTAINER_SELECTOR.matches(&ancestor) {
            return true;
        }
        if ancestor.value().name() == "a" && ancestor.value().attr("href").is_some() {
            return true;
        }
        if ancestor.value().name() == "body" {
            break;
        }
    }
    false
}

fn heading_matches(element: ElementRef, patterns: &[AnchorPattern]) -> bool {
    let text = normalize(&element.text().collect::<String>());
    !text.is_empty() && patterns.iter().any(|p| p.is_match(&text))
}

/// Strategy 2: first heading/block element whose text matches a start alias.
///
/// Wrappers whose match comes from a nested candidate are passed over in
/// favour of that innermost element, otherwise an outer `div` would claim
/// the whole document.
pub fn find_heading<'a>(document: &'a Html, patterns: &[AnchorPattern]) -> Option<ElementRef<'a>> {
    document.select(&HEADING_SELECTOR).find(|element| {
        if !heading_matches(*element, patterns) || is_in_toc(*element) {
            return false;
        }
        let nested_match = element
            .select(&HEADING_SELECTOR)
            .any(|inner| inner.id() != element.id() && heading_matches(inner, patterns));
        !nested_match
    })
}

/// Runs both strategies and resolves the start element.
pub fn locate<'a>(
    document: &'a Html,
    patterns: &[AnchorPattern],
    stop_patterns: &[AnchorPattern],
) -> Result<LocatedSection<'a>, ExtractError> {
    let (start, stop) = find_link_boundaries(document, patterns, stop_patterns);

    if let Some(boundary) = start {
        let id = boundary.id.clone().unwrap_or_default();
        let element = find_by_anchor(document, &id).ok_or_else(|| {
            tracing::warn!("Link target #{} for '{}' not present in document", id, boundary.name);
            ExtractError::BoundaryUnresolved(id.clone())
        })?;
        return Ok(LocatedSection { start: element, boundary, stop });
    }

    tracing::debug!("No matching section link, falling back to heading scan");
    let element = find_heading(document, patterns).ok_or_else(|| {
        let aliases: Vec<&str> = patterns.iter().map(|p| p.as_str()).collect();
        ExtractError::SectionNotFound(format!("no link or heading matches any of {:?}", aliases))
    })?;
    let name = display_label(&element.text().collect::<String>());

    Ok(LocatedSection {
        start: element,
        boundary: SectionBoundary { id: None, name },
        stop,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectionConfig;

    fn mdna() -> (Vec<AnchorPattern>, Vec<AnchorPattern>) {
        let cfg = SectionConfig::management_discussion();
        (
            AnchorPattern::compile_all(&cfg.patterns).unwrap(),
            AnchorPattern::compile_all(&cfg.stop_patterns).unwrap(),
        )
    }

    #[test]
    fn link_strategy_uses_first_matches() {
        let html = Html::parse_document(
            r##"<body>
              <table>
                <tr><td><a href="#i7">Item 7. Management's Discussion and Analysis of Financial Condition and Results of Operations</a></td><td><a href="#i7">40</a></td></tr>
                <tr><td><a href="#i7a">Item 7A. Quantitative and Qualitative Disclosures About Market Risk</a></td></tr>
              </table>
              <p><a href="#other">Management's Discussion and Analysis of Financial Condition and Results of Operations</a></p>
              <div id="i7">Item 7.</div>
              <div id="other">Cross reference</div>
              <div id="i7a">Item 7A.</div>
            </body>"##,
        );
        let (patterns, stops) = mdna();

        let (start, stop) = find_link_boundaries(&html, &patterns, &stops);
        let start = start.unwrap();
        assert_eq!(start.id.as_deref(), Some("i7"));
        assert!(start.name.starts_with("Item 7. Management's Discussion"));
        assert_eq!(stop.unwrap().id.as_deref(), Some("i7a"));

        let located = locate(&html, &patterns, &stops).unwrap();
        assert_eq!(located.start.value().id(), Some("i7"));
    }

    #[test]
    fn link_wins_over_heading() {
        let html = Html::parse_document(
            r##"<body>
              <p><a href="#mdna">Management's Discussion and Analysis of Financial Condition and Results of Operations</a></p>
              <h2>Item 7. Management's Discussion and Analysis of Financial Condition and Results of Operations</h2>
              <div id="mdna">Anchored start</div>
            </body>"##,
        );
        let (patterns, stops) = mdna();
        let located = locate(&html, &patterns, &stops).unwrap();
        assert_eq!(located.start.value().id(), Some("mdna"));
        assert_eq!(located.boundary.id.as_deref(), Some("mdna"));
    }

    #[test]
    fn heading_fallback_when_links_have_no_href() {
        let html = Html::parse_document(
            r#"<body>
              <div class="wrapper">
                <span><a>Management's Discussion and Analysis of Financial Condition and Results of Operations</a></span>
                <h2>Item 2. Management&#8217;s Discussion and Analysis of Financial Condition and Results of Operations</h2>
                <p>Body text.</p>
              </div>
            </body>"#,
        );
        let (patterns, stops) = mdna();
        let located = locate(&html, &patterns, &stops).unwrap();

        assert_eq!(located.start.value().name(), "h2");
        assert!(located.boundary.name.starts_with("Item 2. Management's Discussion"));
        assert_eq!(located.boundary.id, None);
        assert!(located.stop.is_none());
    }

    #[test]
    fn heading_fallback_prefers_innermost_element() {
        let html = Html::parse_document(
            r#"<body><div><div>
                <h2>Item 2. Management's Discussion and Analysis of Financial Condition and Results of Operations</h2>
                <p>Revenue rose.</p>
            </div></div></body>"#,
        );
        let (patterns, _) = mdna();
        let heading = find_heading(&html, &patterns).unwrap();
        assert_eq!(heading.value().name(), "h2");
    }

    #[test]
    fn heading_inside_toc_container_is_skipped() {
        let html = Html::parse_document(
            r#"<body>
              <div id="toc"><p>Management's Discussion and Analysis of Financial Condition and Results of Operations</p></div>
              <h3>Management's Discussion and Analysis of Financial Condition and Results of Operations</h3>
            </body>"#,
        );
        let (patterns, _) = mdna();
        assert_eq!(find_heading(&html, &patterns).unwrap().value().name(), "h3");
    }

    #[test]
    fn link_and_heading_give_the_same_name() {
        let (patterns, stops) = mdna();
        let by_link = Html::parse_document(
            r##"<body>
              <p><a href="#m">Item 7. Management&#8217;s Discussion and Analysis of Financial Condition and Results of Operations</a></p>
              <div id="m">Start</div>
            </body>"##,
        );
        let by_heading = Html::parse_document(
            r#"<body><h2>Item 7. Management's   Discussion and Analysis of Financial Condition and Results of Operations</h2></body>"#,
        );
        let linked = locate(&by_link, &patterns, &stops).unwrap();
        let headed = locate(&by_heading, &patterns, &stops).unwrap();
        assert_eq!(linked.boundary.id.as_deref(), Some("m"));
        assert_eq!(headed.boundary.id, None);
        assert_eq!(linked.boundary.name, headed.boundary.name);
    }

    #[test]
    fn unresolved_link_target_fails() {
        let html = Html::parse_document(
            r##"<body><a href="#missing">Management's Discussion and Analysis of Financial Condition and Results of Operations</a></body>"##,
        );
        let (patterns, stops) = mdna();
        let err = locate(&html, &patterns, &stops).unwrap_err();
        assert!(matches!(err, ExtractError::BoundaryUnresolved(ref id) if id == "missing"));
    }

    #[test]
    fn nothing_found() {
        let html = Html::parse_document("<body><p>Exhibit 99.1</p></body>");
        let (patterns, stops) = mdna();
        assert!(matches!(locate(&html, &patterns, &stops), Err(ExtractError::SectionNotFound(_))));
    }

    #[test]
    fn resolves_legacy_named_anchors() {
        let html = Html::parse_document(r#"<body><p><a name="item7"></a>Item 7</p></body>"#);
        let el = find_by_anchor(&html, "item7").unwrap();
        assert_eq!(el.value().name(), "a");
        assert_eq!(link_target("filing.htm#item7").as_deref(), Some("item7"));
        assert_eq!(link_target("#"), None);
    }
}
