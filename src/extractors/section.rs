// src/extractors/section.rs

// --- Imports ---
use crate::config::{ExtractorConfig, SectionConfig};
use crate::edgar::models::FormType;
use crate::extractors::items::{segment_document, ItemMap};
use crate::extractors::locator::locate;
use crate::extractors::patterns::{normalize, AnchorPattern};
use crate::extractors::table::TableFormat;
use crate::extractors::walker::{next_item_pattern, walk};
use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;

// --- CSS Selectors (Lazy Static) ---
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to compile LINK_SELECTOR")
});

// --- Data Structures ---
/// Final text of one located section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String, // label found in the document, e.g. "Item 7. Management's Discussion ..."
    pub content: String,
}

/// A configured section that could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSection {
    pub name: String, // configured name
    pub reason: String,
}

/// Sections of one document by name, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    sections: Vec<Section>,
    missing: Vec<MissingSection>,
}

impl ExtractionResult {
    /// Adds a section unless one with the same name is already present.
    pub fn insert(&mut self, section: Section) -> bool {
        if self.get(&section.name).is_some() {
            tracing::debug!("Section '{}' already extracted, skipping duplicate", section.name);
            return false;
        }
        self.sections.push(section);
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.content.as_str())
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn missing(&self) -> &[MissingSection] {
        &self.missing
    }

    /// Found sections as `"<name>\n<content>"`, then a note for each
    /// section that could not be located, separated by blank lines.
    pub fn render(&self) -> String {
        let found = self.sections.iter().map(|s| {
            if s.content.is_empty() {
                s.name.clone()
            } else {
                format!("{}\n{}", s.name, s.content)
            }
        });
        let missing = self
            .missing
            .iter()
            .map(|m| format!("{}: section could not be located ({})", m.name, m.reason));
        found.chain(missing).collect::<Vec<_>>().join("\n\n")
    }
}

struct CompiledSection {
    name: String,
    patterns: Vec<AnchorPattern>,
    stop_patterns: Vec<AnchorPattern>,
}

/// Removes "Table of Contents" back-links, along with every other link
/// pointing at the same place. Returns how many links were dropped.
pub fn strip_toc_backlinks(document: &mut Html) -> usize {
    let toc_targets: HashSet<String> = document
        .select(&LINK_SELECTOR)
        .filter(|a| normalize(&a.text().collect::<String>()).contains("table of contents"))
        .filter_map(|a| a.value().attr("href").map(str::to_string))
        .collect();
    if toc_targets.is_empty() {
        return 0;
    }

    let doomed: Vec<_> = document
        .select(&LINK_SELECTOR)
        .filter(|a| a.value().attr("href").is_some_and(|h| toc_targets.contains(h)))
        .map(|a| a.id())
        .collect();
    for id in &doomed {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }
    tracing::debug!("Removed {} table-of-contents links", doomed.len());
    doomed.len()
}

// --- Main Extractor Structure ---
pub struct SectionExtractor {
    sections: Vec<CompiledSection>,
    table_format: TableFormat,
}

impl SectionExtractor {
    pub fn new(sections: &[SectionConfig], table_format: TableFormat) -> Result<Self, ExtractError> {
        let sections = sections
            .iter()
            .map(|s| {
                Ok(CompiledSection {
                    name: s.name.clone(),
                    patterns: AnchorPattern::compile_all(&s.patterns)?,
                    stop_patterns: AnchorPattern::compile_all(&s.stop_patterns)?,
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;
        Ok(Self { sections, table_format })
    }

    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        Self::new(&config.sections, config.table_format)
    }

    /// Extracts every configured section from a 10-K/10-Q style document.
    pub fn extract_sections(&self, html_content: &str) -> ExtractionResult {
        let mut document = Html::parse_document(html_content);
        strip_toc_backlinks(&mut document);

        let mut result = ExtractionResult::default();
        for section in &self.sections {
            match self.extract_one(&document, section) {
                Ok(found) => {
                    tracing::info!("Extracted '{}' ({} chars)", found.name, found.content.len());
                    result.insert(found);
                }
                Err(e) => {
                    tracing::warn!("Could not locate '{}': {}", section.name, e);
                    result.missing.push(MissingSection {
                        name: section.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        result
    }

    fn extract_one(&self, document: &Html, section: &CompiledSection) -> Result<Section, ExtractError> {
        let located = locate(document, &section.patterns, &section.stop_patterns)?;
        tracing::debug!(
            "'{}' starts at <{}> (id {:?}), stop {:?}",
            section.name,
            located.start.value().name(),
            located.boundary.id,
            located.stop.as_ref().and_then(|s| s.id.as_deref())
        );

        let start_text = located.start.text().collect::<String>();
        let next_item = next_item_pattern(&start_text).or_else(|| next_item_pattern(&located.boundary.name));
        let content = walk(located.start, located.stop.as_ref(), next_item.as_ref(), self.table_format);

        let name = if located.boundary.name.is_empty() {
            section.name.clone()
        } else {
            located.boundary.name
        };
        Ok(Section { name, content })
    }

    /// Item-segmented form, for current reports.
    pub fn extract_items(&self, html_content: &str) -> Result<ItemMap, ExtractError> {
        let document = Html::parse_document(html_content);
        segment_document(&document)
    }

    /// Text for one filing document of the given type.
    ///
    /// A section that cannot be located is reported inline in the text
    /// rather than as an error, so an empty section stays distinguishable
    /// from a missing one.
    pub fn extract_filing(&self, form_type: FormType, html_content: &str) -> String {
        match form_type {
            FormType::EightK => match self.extract_items(html_content) {
                Ok(items) => items.render(),
                Err(e) => format!("Items: section could not be located ({})", e),
            },
            FormType::TenK | FormType::TenQ => self.extract_sections(html_content).render(),
        }
    }
}
