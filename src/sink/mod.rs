//! Sink module for forwarding scraped records downstream
//!
//! # Components
//!
//! - `Sink`: accepts one record at a time and reports the downstream status
//! - `HttpSink`: the ingestion API client (`POST /ingest`, `GET /urls`)
//! - `RetryPolicy`: bounded exponential backoff, longer for rate limiting
//! - `Ingestor`: pre-filters, limits and pushes a scraped file through a sink

mod backoff;
mod http;
mod ingest;

pub use backoff::{ExponentialBackoff, RetryPolicy};
pub use http::HttpSink;
pub use ingest::{IngestReport, Ingestor};

use crate::storage::ScrapedRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Status token the sink returns for a newly stored record
pub const STATUS_INGESTED: &str = "ingested";

/// Sink-side failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("rate limited by sink")]
    RateLimited,

    #[error("sink server error (HTTP {status})")]
    Server { status: u16 },

    #[error("sink rejected request (HTTP {status}): {body}")]
    Client { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not decode sink response: {0}")]
    Decode(String),
}

impl SinkError {
    /// True for failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server { .. } | Self::Network(_) | Self::Timeout(_)
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Acknowledgement returned by `Sink::put`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SinkAck {
    pub status: String,
}

impl SinkAck {
    /// True when the sink stored the record, as opposed to skipping it
    pub fn is_ingested(&self) -> bool {
        self.status == STATUS_INGESTED
    }
}

/// Downstream store for scraped records
#[async_trait]
pub trait Sink: Send + Sync {
    /// Submits one record
    async fn put(&self, record: &ScrapedRecord) -> Result<SinkAck, SinkError>;

    /// URLs the sink already holds
    async fn known_urls(&self) -> Result<HashSet<String>, SinkError>;
}
