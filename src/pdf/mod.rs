//! PDF path: text layer -> rows and tables -> page text.

pub mod layout;
pub mod reader;

pub use layout::{reconstruct, GlyphRun, LayoutOptions, Token};

use crate::utils::error::ExtractError;

/// Extracts reading-order text from PDF bytes.
pub fn extract_pdf(bytes: &[u8], options: &LayoutOptions) -> Result<String, ExtractError> {
    let pages = reader::read_pages(bytes)?;
    let text = reconstruct(&pages, options);
    tracing::info!("Reconstructed {} PDF pages ({} chars)", pages.len(), text.len());
    Ok(text)
}
