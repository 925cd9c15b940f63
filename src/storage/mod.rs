//! Storage module for persisting scrape results
//!
//! This module handles:
//! - The `ScrapedRecord` shape written to disk and sent downstream
//! - The `RecordStore` trait the orchestrator checkpoints through
//! - An atomic JSON file implementation of that trait

mod json_store;
mod record;
mod traits;

pub use json_store::JsonFileStore;
pub(crate) use json_store::{read_json_array, write_json_atomic};
pub use record::ScrapedRecord;
pub use traits::{RecordStore, StorageError, StorageResult};

use std::collections::HashSet;

/// Collects the checkpoint set: every URL already present in `records`
pub fn checkpoint_urls(records: &[ScrapedRecord]) -> HashSet<String> {
    records.iter().map(|r| r.url.clone()).collect()
}

/// Computes the backlog: `all_urls` minus the checkpoint, order preserved
pub fn remaining_urls(all_urls: &[String], checkpoint: &HashSet<String>) -> Vec<String> {
    all_urls
        .iter()
        .filter(|url| !checkpoint.contains(url.as_str()))
        .cloned()
        .collect()
}
