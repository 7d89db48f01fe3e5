// src/extractors/walker.rs
//! Walks forward from a section's start element, sibling by sibling,
//! collecting text and rendered tables until a stop condition fires.

use crate::extractors::locator::SectionBoundary;
use crate::extractors::patterns::normalize;
use crate::extractors::table::{render, table_rows, TableFormat};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Node, ElementRef, Selector};

const BOILERPLATE: &str = "table of contents";
// Elements longer than this that mention the ToC are descended into
// instead of dropped whole.
const BOILERPLATE_MAX_LEN: usize = 200;

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ITEM_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bitem\s+(\d{1,2})\b").expect("Failed to compile ITEM_NUMBER_RE")
});

// Inline wrappers that anchors commonly sit in; walking their siblings
// would only cover the rest of one line.
const INLINE_TAGS: [&str; 9] = ["a", "span", "b", "strong", "i", "em", "u", "font", "sup"];

/// Pattern for the heading that follows item `n`, taken from the start
/// element's own "Item N" label.
pub fn next_item_pattern(start_text: &str) -> Option<Regex> {
    let number: u32 = ITEM_NUMBER_RE.captures(start_text)?.get(1)?.as_str().parse().ok()?;
    Regex::new(&format!(r"^item\s+{}\b", number + 1)).ok()
}

/// Bookkeeping for one walk. Lives only for the duration of `walk`.
struct WalkState<'s> {
    stop_id: Option<&'s str>,
    next_item: Option<&'s Regex>,
    format: TableFormat,
    lines: Vec<String>,
}

impl<'s> WalkState<'s> {
    fn hits_stop_anchor(&self, element: ElementRef) -> bool {
        match self.stop_id {
            Some(id) if carries_anchor(element, id) => {
                tracing::debug!("Reached stop anchor #{}", id);
                true
            }
            _ => false,
        }
    }

    fn should_stop(&self, element: ElementRef) -> bool {
        if self.hits_stop_anchor(element) {
            return true;
        }
        if let Some(re) = self.next_item {
            let text = normalize(&element.text().collect::<String>());
            if re.is_match(&text) {
                tracing::debug!("Reached next item heading '{}'", text);
                return true;
            }
        }
        false
    }

    fn finish(self, start: ElementRef) -> String {
        if self.lines.is_empty() {
            tracing::debug!("Walk from <{}> produced no text", start.value().name());
        }
        self.lines.join("\n").trim().to_string()
    }

    fn push_text(&mut self, text: &str) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.lines.push(trimmed.to_string());
        }
    }

    fn render_element(&mut self, element: ElementRef) {
        if element.value().name() == "table" {
            let rows = table_rows(element);
            if !rows.is_empty() {
                self.lines.push(render(&rows, self.format));
            }
            return;
        }

        let text = element.text().collect::<String>();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let boilerplate = trimmed.to_lowercase().contains(BOILERPLATE);
        if boilerplate && trimmed.len() <= BOILERPLATE_MAX_LEN {
            tracing::trace!("Dropping boilerplate '{}'", trimmed);
            return;
        }

        let has_table = element.select(&TABLE_SELECTOR).next().is_some();
        if boilerplate || has_table {
            self.render_children(element);
        } else {
            self.push_text(trimmed);
        }
    }

    fn render_children(&mut self, element: ElementRef) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        self.render_element(child_el);
                    }
                }
                _ => {}
            }
        }
    }
}

/// True when the element or any descendant is the target of `#id`.
fn carries_anchor(element: ElementRef, id: &str) -> bool {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| el.value().id() == Some(id) || (el.value().name() == "a" && el.value().attr("name") == Some(id)))
}

fn is_inline(element: ElementRef) -> bool {
    INLINE_TAGS.contains(&element.value().name())
}

fn is_document_root(element: ElementRef) -> bool {
    matches!(element.value().name(), "body" | "html")
}

/// Where the walk proper begins: the block enclosing `start`, plus the
/// text of `start` and of everything after it inside that block.
struct LeadingBlock<'a> {
    block: ElementRef<'a>,
    text: String,
    // Stop anchor met before the block ended.
    stopped: bool,
}

/// Climbs from an inline `start` to its enclosing block. Text that precedes
/// `start` in the block is not part of the section.
fn leading_block<'a>(start: ElementRef<'a>, stop_id: Option<&str>) -> LeadingBlock<'a> {
    let mut text = start.text().collect::<String>();
    let mut current = start;
    while is_inline(current) {
        let Some(parent) = current.parent().and_then(ElementRef::wrap) else {
            break;
        };
        if is_document_root(parent) {
            break;
        }
        for sibling in current.next_siblings() {
            match sibling.value() {
                Node::Text(t) => text.push_str(t),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(sibling) {
                        if stop_id.is_some_and(|id| carries_anchor(el, id)) {
                            return LeadingBlock { block: parent, text, stopped: true };
                        }
                        text.extend(el.text());
                    }
                }
                _ => {}
            }
        }
        current = parent;
    }
    LeadingBlock { block: current, text, stopped: false }
}

/// Collects section text from `start` up to (not including) the stop.
///
/// The start element is always emitted. After it come its following
/// siblings, then the following siblings of each ancestor in turn, so an
/// anchor at the end of a page wrapper carries on into the next page but
/// never picks up what came before it. The walk ends at the first element
/// carrying the stop boundary's id (on itself or a descendant), at the
/// element whose text opens the next item (when `next_item` is given), or
/// at the end of the document.
pub fn walk(
    start: ElementRef,
    stop: Option<&SectionBoundary>,
    next_item: Option<&Regex>,
    format: TableFormat,
) -> String {
    let mut state = WalkState {
        stop_id: stop.and_then(|b| b.id.as_deref()),
        next_item,
        format,
        lines: Vec::new(),
    };

    let leading = leading_block(start, state.stop_id);
    if leading.block.id() == start.id() {
        state.render_element(start);
    } else {
        state.push_text(&leading.text);
    }
    let start_holds_stop = state.stop_id.is_some_and(|id| carries_anchor(start, id));
    if leading.stopped || start_holds_stop {
        tracing::debug!("Stop anchor sits inside the start block");
        return state.finish(start);
    }

    let mut current = leading.block;
    'climb: loop {
        for sibling in current.next_siblings() {
            match sibling.value() {
                Node::Text(text) => state.push_text(text),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(sibling) {
                        if state.should_stop(el) {
                            break 'climb;
                        }
                        state.render_element(el);
                    }
                }
                _ => {}
            }
        }
        match current.parent().and_then(ElementRef::wrap) {
            Some(parent) if !is_document_root(parent) => current = parent,
            _ => break,
        }
    }

    state.finish(start)
}
