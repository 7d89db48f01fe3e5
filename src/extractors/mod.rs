// src/extractors/mod.rs
pub mod items;
pub mod locator;
pub mod patterns;
pub mod section;
pub mod table;
pub mod walker;

// Re-export key extraction types for convenience
pub use items::{segment, ItemMap};
pub use locator::{locate, SectionBoundary};
pub use patterns::AnchorPattern;
pub use section::{ExtractionResult, Section, SectionExtractor};
pub use table::TableFormat;
pub use walker::walk;
