//! Movie-Harvester: a resumable movie metadata scraper
//!
//! This crate discovers content pages from a site's sitemap, scrapes their metadata
//! in checkpointed batches under a concurrency limit, and forwards the results to a
//! downstream ingestion API.

pub mod config;
pub mod crawler;
pub mod discovery;
pub mod output;
pub mod sink;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid content pattern: {0}")]
    Pattern(String),
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Orchestrator, TaskOutcome, TaskRunner};
pub use state::{BatchPhase, RunState};
pub use storage::{JsonFileStore, RecordStore, ScrapedRecord};
