// src/utils/error.rs
use thiserror::Error;

// Errors talking to the document source (the "fetch" failures of a report entry)
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500, 503

    #[error("SEC rate limit likely exceeded")]
    RateLimited, // 403 from EDGAR usually means User-Agent or request rate

    #[error("Could not find CIK for ticker {0}")]
    TickerNotFound(String),

    #[error("Could not find specified filing: {0}")]
    FilingDocNotFound(String),

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),

    #[error("HTTP client unavailable: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Section boundary '{0}' does not resolve to an element")]
    BoundaryUnresolved(String),

    #[error("Invalid section pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ExtractError {
    /// True for the two "could not locate" conditions, which callers report
    /// as a located-nothing note instead of failing the whole document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExtractError::SectionNotFound(_) | ExtractError::BoundaryUnresolved(_))
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Invalid arguments: {0}")]
    Usage(String),
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Task(e.to_string())
    }
}
