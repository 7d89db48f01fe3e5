// src/extractors/table.rs
use crate::extractors::patterns::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

static CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("th, td").expect("Failed to compile CELL_SELECTOR")
});

/// How tables are written into section text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// `| cell | cell |` lines
    #[default]
    Pipe,
    /// `JSON TABLE: [["cell","cell"],...]`
    Json,
}

pub const JSON_TABLE_LABEL: &str = "JSON TABLE: ";

/// Cell texts of an HTML table, whitespace collapsed. Empty cells and rows
/// left with no cells are dropped.
pub fn table_rows(table: ElementRef) -> Vec<Vec<String>> {
    table
        .select(&ROW_SELECTOR)
        .map(|row| {
            row.select(&CELL_SELECTOR)
                .map(|cell| collapse_whitespace(&cell.text().collect::<String>()))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect()
}

pub fn render_pipe(rows: &[Vec<String>]) -> String {
    rows.iter()
        .filter(|cells| !cells.is_empty())
        .map(|cells| format!("| {} |", cells.join(" | ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_json(rows: &[Vec<String>]) -> String {
    // Serializing a Vec<Vec<String>> cannot fail.
    let json = serde_json::to_string(rows).unwrap_or_else(|_| "[]".to_string());
    format!("{}{}", JSON_TABLE_LABEL, json)
}

pub fn render(rows: &[Vec<String>], format: TableFormat) -> String {
    match format {
        TableFormat::Pipe => render_pipe(rows),
        TableFormat::Json => render_json(rows),
    }
}
