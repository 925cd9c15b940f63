//! JSON file backed record store
//!
//! The whole record set lives in one pretty-printed JSON array. Every save
//! rewrites it through a sibling temp file and a rename, so readers only ever
//! observe the previous set or the new one.

use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::ScrapedRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Record store persisted as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store at `path`; nothing is touched until the first load or save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonFileStore {
    fn load(&self) -> StorageResult<Vec<ScrapedRecord>> {
        Ok(read_json_array(&self.path)?.unwrap_or_default())
    }

    fn save(&mut self, records: &[ScrapedRecord]) -> StorageResult<()> {
        write_json_atomic(&self.path, records)?;
        tracing::debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Reads a JSON array from `path`
///
/// Returns `Ok(None)` when the file does not exist. An empty file reads as an
/// empty array. Anything else that fails to parse is `Corrupt`, never silently
/// empty, so a damaged checkpoint cannot be overwritten by a fresh run.
pub(crate) fn read_json_array<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<Vec<T>>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if content.trim().is_empty() {
        return Ok(Some(Vec::new()));
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Serializes `value` to `path` via a temp file in the same directory
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let mut file = fs::File::create(&tmp_path)?;
        serde_json::to_writer_pretty(&mut file, value)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
