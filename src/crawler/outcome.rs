//! Per-URL task results

use crate::storage::ScrapedRecord;
use std::time::Duration;
use thiserror::Error;

/// Why a single scrape task produced no record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("content markers never appeared")]
    MissingMarkers,

    #[error("could not open session: {0}")]
    Session(String),

    #[error("task aborted before completing")]
    Aborted,
}

/// Result of scraping one URL
///
/// There are no partial records: a task either yields a whole record or a
/// failure reason.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    Success(ScrapedRecord),
    Failure { url: String, reason: TaskError },
}

impl TaskOutcome {
    /// The URL this outcome belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Success(record) => &record.url,
            Self::Failure { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_record(self) -> Option<ScrapedRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Failure { .. } => None,
        }
    }
}
