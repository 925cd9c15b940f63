//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::storage::ScrapedRecord;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unreadable data in {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the scraped record set
///
/// The stored set doubles as the checkpoint: any URL it holds is done. The
/// orchestrator is the only writer and only calls `save` between batches, with
/// the full accumulated set each time.
pub trait RecordStore {
    /// Loads every persisted record; an absent store is empty
    fn load(&self) -> StorageResult<Vec<ScrapedRecord>>;

    /// Replaces the persisted set with `records`
    ///
    /// Implementations must not leave a partially written set behind if the
    /// process dies during the call.
    fn save(&mut self, records: &[ScrapedRecord]) -> StorageResult<()>;

    /// Human-readable location used in log lines
    fn describe(&self) -> String;
}
