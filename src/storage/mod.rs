// src/storage/mod.rs
use crate::utils::error::StorageError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What was saved alongside a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub subject: String, // ticker, or "uploads" when only files were given
    pub company_name: Option<String>,
    pub documents: Vec<String>,
    pub content_length: usize,
    pub generated_at: DateTime<Utc>,
}

impl ReportMetadata {
    pub fn new(subject: &str, company_name: Option<String>, documents: Vec<String>, report: &str) -> Self {
        Self {
            subject: subject.to_string(),
            company_name,
            documents,
            content_length: report.len(),
            generated_at: Utc::now(),
        }
    }

    fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            self.subject.to_uppercase(),
            self.generated_at.format("%Y%m%dT%H%M%SZ")
        )
    }
}

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self { base_dir: base_path })
    }

    fn target_dir(&self, meta: &ReportMetadata) -> Result<PathBuf, StorageError> {
        // e.g. /base_dir/AAPL/
        let dir = self.base_dir.join(meta.subject.to_uppercase());
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Writes the report text; returns its path.
    pub fn save_report(&self, report: &str, meta: &ReportMetadata) -> Result<PathBuf, StorageError> {
        let file_path = self
            .target_dir(meta)?
            .join(format!("{}_report.txt", meta.file_stem()));
        fs::write(&file_path, report)?;
        tracing::info!("Saved report to {}", file_path.display());
        Ok(file_path)
    }

    /// Writes the prompt-wrapped report next to the plain one.
    pub fn save_prompt(&self, prompt: &str, meta: &ReportMetadata) -> Result<PathBuf, StorageError> {
        let file_path = self
            .target_dir(meta)?
            .join(format!("{}_prompt.txt", meta.file_stem()));
        fs::write(&file_path, prompt)?;
        tracing::info!("Saved prompt to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves metadata about the report in JSON format
    pub fn save_metadata(&self, meta: &ReportMetadata) -> Result<PathBuf, StorageError> {
        let file_path = self
            .target_dir(meta)?
            .join(format!("{}_meta.json", meta.file_stem()));
        let metadata_str = serde_json::to_string_pretty(meta)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str)?;
        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}
