//! On-disk cache of discovered URLs

use crate::storage::{read_json_array, write_json_atomic, StorageResult};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A JSON array of URL strings, rewritten whole after each fresh discovery
#[derive(Debug, Clone)]
pub struct UrlCache {
    path: PathBuf,
    max_age: Option<Duration>,
}

impl UrlCache {
    /// `max_age` of `None` means the cache never expires
    pub fn new(path: impl Into<PathBuf>, max_age: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached list
    ///
    /// Returns `Ok(None)` when there is no cache file or it has expired.
    pub fn load(&self) -> StorageResult<Option<Vec<String>>> {
        if self.is_expired() {
            tracing::info!("URL cache {} is older than its max age", self.path.display());
            return Ok(None);
        }
        read_json_array(&self.path)
    }

    /// Overwrites the cache with `urls`
    pub fn store(&self, urls: &[String]) -> StorageResult<()> {
        write_json_atomic(&self.path, urls)
    }

    /// True when a max age is set and the file's mtime is older than it
    fn is_expired(&self) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };

        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return false,
        };

        SystemTime::now()
            .duration_since(modified)
            .map(|age| age > max_age)
            .unwrap_or(false)
    }
}
