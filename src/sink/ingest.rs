//! Ingestion driver - pushes scraped records through a sink
//!
//! This module handles:
//! - Pre-filtering records the sink already holds (soft on failure)
//! - Limiting how many new records one run submits
//! - Retrying each submission under a `RetryPolicy`
//! - Counting ingested, unexpected and failed submissions

use crate::sink::{RetryPolicy, Sink, SinkAck, SinkError};
use crate::storage::ScrapedRecord;
use std::sync::Arc;

/// Counts for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records in the scraped file
    pub scraped: usize,

    /// Records skipped because the sink already holds their URL
    pub already_present: usize,

    /// Records submitted this run
    pub total: usize,

    /// Submissions acknowledged as `ingested`
    pub ingested: usize,

    /// Submissions acknowledged with any other status
    pub unexpected: usize,

    /// Submissions that still failed after retrying
    pub failed: usize,
}

impl IngestReport {
    /// True when there was work to do and none of it was ingested
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.ingested == 0
    }
}

/// Drives records into a sink one at a time
pub struct Ingestor {
    sink: Arc<dyn Sink>,
    policy: RetryPolicy,
    progress_every: usize,
}

impl Ingestor {
    pub fn new(sink: Arc<dyn Sink>, policy: RetryPolicy, progress_every: usize) -> Self {
        Self {
            sink,
            policy,
            progress_every: progress_every.max(1),
        }
    }

    /// Submits every record the sink does not already hold
    ///
    /// # Arguments
    ///
    /// * `records` - The full scraped record set
    /// * `limit` - Maximum number of new records to submit, if any
    pub async fn run(&self, records: &[ScrapedRecord], limit: Option<usize>) -> IngestReport {
        let mut report = IngestReport {
            scraped: records.len(),
            ..IngestReport::default()
        };

        let known = match self.sink.known_urls().await {
            Ok(known) => {
                tracing::info!("{} URLs already ingested downstream", known.len());
                known
            }
            Err(e) => {
                tracing::warn!("Could not fetch ingested URLs ({}); proceeding without pre-filter", e);
                Default::default()
            }
        };

        let mut pending: Vec<&ScrapedRecord> = records
            .iter()
            .filter(|r| !known.contains(&r.url))
            .collect();
        report.already_present = records.len() - pending.len();

        tracing::info!(
            "{} scraped, {} already ingested, {} new",
            report.scraped,
            report.already_present,
            pending.len()
        );

        if let Some(limit) = limit {
            if pending.len() > limit {
                pending.truncate(limit);
                tracing::info!("Limiting this run to {} records", limit);
            }
        }

        report.total = pending.len();
        if pending.is_empty() {
            tracing::info!("Nothing new to ingest");
            return report;
        }

        for (i, record) in pending.iter().enumerate() {
            match self.put_with_retry(record).await {
                Ok(ack) if ack.is_ingested() => report.ingested += 1,
                Ok(ack) => {
                    report.unexpected += 1;
                    tracing::warn!("Unexpected skip for '{}': status {}", record.label(), ack.status);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Failed to ingest '{}': {}", record.label(), e);
                }
            }

            let done = i + 1;
            if done % self.progress_every == 0 || done == report.total {
                tracing::info!(
                    "Progress: {}/{} | Ingested: {} | Failed: {}",
                    done,
                    report.total,
                    report.ingested,
                    report.unexpected + report.failed
                );
            }
        }

        report
    }

    /// Submits one record, backing off between retryable failures
    ///
    /// Returns the last error once the attempt ceiling is reached.
    pub async fn put_with_retry(&self, record: &ScrapedRecord) -> Result<SinkAck, SinkError> {
        let mut attempt = 1;
        loop {
            match self.sink.put(record).await {
                Ok(ack) => return Ok(ack),
                Err(e) => match self.policy.next_delay(attempt, &e) {
                    Some(delay) => {
                        tracing::debug!(
                            "Attempt {}/{} for {} failed ({}); retrying in {:?}",
                            attempt,
                            self.policy.max_attempts,
                            record.url,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
            }
        }
    }
}
