// src/report/batch.rs
use crate::config::ExtractorConfig;
use crate::edgar::client::DocumentFetcher;
use crate::edgar::models::{FilingRef, FormType};
use crate::extractors::section::SectionExtractor;
use crate::pdf::{self, reader::looks_like_pdf, LayoutOptions};
use crate::report::assembler::{assemble, ReportEntry};
use crate::utils::error::{AppError, ExtractError};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// One document to include in a report.
#[derive(Debug, Clone)]
pub enum ReportSource {
    /// A filing document fetched from its URL.
    Filing(FilingRef),
    /// A PDF supplied directly by the user.
    Upload { file_name: String, bytes: Vec<u8> },
}

impl ReportSource {
    pub fn label(&self) -> String {
        match self {
            ReportSource::Filing(filing) => filing.label(),
            ReportSource::Upload { file_name, .. } => format!("Uploaded File: {}", file_name),
        }
    }
}

/// Processes every source with at most `fetch.max_concurrency` in flight and
/// assembles the results in input order. Per-document failures end up in the
/// report text; only an invalid section configuration fails the whole call.
pub async fn analyze<F>(
    fetcher: &F,
    config: &ExtractorConfig,
    sources: Vec<ReportSource>,
) -> Result<String, AppError>
where
    F: DocumentFetcher + ?Sized,
{
    let extractor = Arc::new(SectionExtractor::from_config(config)?);
    let limit = config.fetch.max_concurrency.max(1);
    tracing::info!("Analyzing {} documents ({} at a time)", sources.len(), limit);

    let entries: Vec<ReportEntry> = stream::iter(sources)
        .map(|source| {
            let extractor = Arc::clone(&extractor);
            let layout = config.layout;
            async move {
                let label = source.label();
                match process(fetcher, extractor, layout, source).await {
                    Ok(text) => ReportEntry::success(label, text),
                    Err(e) => {
                        tracing::error!("{} failed: {}", label, e);
                        ReportEntry::failure(label, failure_message(&e))
                    }
                }
            }
        })
        .buffered(limit)
        .collect()
        .await;

    Ok(assemble(&entries))
}

async fn process<F>(
    fetcher: &F,
    extractor: Arc<SectionExtractor>,
    layout: LayoutOptions,
    source: ReportSource,
) -> Result<String, AppError>
where
    F: DocumentFetcher + ?Sized,
{
    match source {
        ReportSource::Filing(filing) => {
            let bytes = fetcher.fetch(&filing.url).await?;
            tracing::debug!("Fetched {} ({} bytes)", filing.url, bytes.len());
            let form_type = filing.form_type;
            // Parsed trees are not Send, so parsing stays on the blocking thread.
            let text = tokio::task::spawn_blocking(move || extract_html_bytes(&extractor, form_type, &bytes))
                .await??;
            Ok(text)
        }
        ReportSource::Upload { bytes, .. } => {
            let text = tokio::task::spawn_blocking(move || pdf::extract_pdf(&bytes, &layout)).await??;
            Ok(text)
        }
    }
}

/// Section text for an HTML filing document given as raw bytes.
pub fn extract_html_bytes(
    extractor: &SectionExtractor,
    form_type: FormType,
    bytes: &[u8],
) -> Result<String, ExtractError> {
    if looks_like_pdf(bytes) {
        return Err(ExtractError::UnsupportedContent(format!(
            "{} document is a PDF, expected HTML",
            form_type
        )));
    }
    let html = String::from_utf8_lossy(bytes);
    Ok(extractor.extract_filing(form_type, &html))
}

// The report carries the underlying cause, not the wrapper's prefix.
fn failure_message(error: &AppError) -> String {
    match error {
        AppError::Edgar(e) => e.to_string(),
        AppError::Extraction(e) => e.to_string(),
        other => other.to_string(),
    }
}
