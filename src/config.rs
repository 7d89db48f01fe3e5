// src/config.rs
//! Extraction settings: which sections to pull (as alias pattern lists),
//! PDF layout constants, table rendering and fetch behaviour.
//!
//! Everything has a built-in default so a config file is optional. A file
//! only needs the keys it wants to change:
//!
//! ```json
//! { "sections": [ { "name": "Risk Factors", "patterns": ["risk factors"] } ] }
//! ```

use crate::extractors::table::TableFormat;
use crate::pdf::layout::LayoutOptions;
use crate::utils::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_USER_AGENT: &str = "filing-digest admin@example.com";
/// Env var overriding the User-Agent sent to EDGAR.
pub const USER_AGENT_ENV: &str = "SEC_USER_AGENT";

/// One logical section and the aliases filers use for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub name: String,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub stop_patterns: Vec<String>,
}

impl SectionConfig {
    pub fn management_discussion() -> Self {
        Self {
            name: "Management's Discussion and Analysis".to_string(),
            patterns: vec![
                "management's discussion and analysis of financial condition and results of operations".to_string(),
                "discussion and analysis of financial condition and results of operations".to_string(),
                r"item \d{1,2}: management's discussion and analysis of financial condition and results of operations".to_string(),
                r"item \d{1,2}\. management's discussion".to_string(),
            ],
            stop_patterns: vec![
                "quantitative and qualitative disclosures about market risk".to_string(),
                r"item \d{1,2}: quantitative and qualitative disclosures about market risk".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub max_concurrency: usize,
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_concurrency: 4,
            // SEC asks for 10 requests/second max. Be conservative.
            request_delay_ms: 150,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub sections: Vec<SectionConfig>,
    pub layout: LayoutOptions,
    pub table_format: TableFormat,
    pub fetch: FetchConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            sections: vec![SectionConfig::management_discussion()],
            layout: LayoutOptions::default(),
            table_format: TableFormat::Pipe,
            fetch: FetchConfig::default(),
        }
    }
}

impl ExtractorConfig {
    /// Reads a JSON config file, then applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!("Loaded config from {} ({} sections)", path.display(), config.sections.len());
        config.with_env_overrides().validated()
    }

    /// Defaults plus environment overrides, for runs without `--config`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides().validated()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(agent) = std::env::var(USER_AGENT_ENV) {
            if !agent.trim().is_empty() {
                tracing::debug!("Using User-Agent from {}", USER_AGENT_ENV);
                self.fetch.user_agent = agent;
            }
        }
        self
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.fetch.max_concurrency == 0 {
            return Err(ConfigError::Invalid("fetch.max_concurrency must be at least 1".to_string()));
        }
        if !self.layout.row_tolerance.is_finite() || self.layout.row_tolerance < 0.0 {
            return Err(ConfigError::Invalid("layout.row_tolerance must be a non-negative number".to_string()));
        }
        if let Some(section) = self.sections.iter().find(|s| s.patterns.is_empty()) {
            return Err(ConfigError::Invalid(format!("section '{}' has no patterns", section.name)));
        }
        Ok(self)
    }
}
