//! Batch orchestrator - checkpointed scrape loop
//!
//! This module drives a whole scrape run:
//! - Loading the persisted record set and computing what is left to do
//! - Splitting the backlog into fixed-size batches, processed strictly in order
//! - Running each batch, then one reduced-concurrency retry over its gaps
//! - Persisting the accumulated record set after every batch
//!
//! The save after each batch is the only durability point. An interrupt while
//! a batch is in flight abandons that batch and leaves the earlier ones intact.

use crate::config::ScraperConfig;
use crate::crawler::runner::TaskRunner;
use crate::crawler::TaskOutcome;
use crate::state::{BatchPhase, BatchTally, RunState};
use crate::storage::{checkpoint_urls, remaining_urls, RecordStore, ScrapedRecord};
use crate::url::dedupe_preserving_order;
use crate::HarvestError;
use std::collections::{HashMap, HashSet};
use std::future::Future;

/// Batch sizing and concurrency for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    pub batch_size: usize,
    pub concurrency: usize,
    pub retry_concurrency: usize,
}

impl BatchSettings {
    pub fn from_config(config: &ScraperConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            retry_concurrency: config.effective_retry_concurrency(),
        }
    }
}

/// Work in progress for one batch, advanced phase by phase
struct BatchWork {
    phase: BatchPhase,
    urls: Vec<String>,
    outcomes: Vec<TaskOutcome>,
    successes: Vec<ScrapedRecord>,
    gaps: Vec<String>,
    tally: BatchTally,
}

impl BatchWork {
    fn new(urls: &[String]) -> Self {
        Self {
            phase: BatchPhase::Attempt,
            urls: urls.to_vec(),
            outcomes: Vec::new(),
            successes: Vec::new(),
            gaps: Vec::new(),
            tally: BatchTally {
                attempted: urls.len(),
                ..BatchTally::default()
            },
        }
    }

    fn advance(&mut self, next: BatchPhase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "invalid batch transition {} -> {}",
            self.phase,
            next
        );
        tracing::trace!("Batch phase {} -> {}", self.phase, next);
        self.phase = next;
    }
}

/// Runs the checkpointed batch loop over a record store
pub struct Orchestrator<S: RecordStore> {
    runner: TaskRunner,
    store: S,
    settings: BatchSettings,
}

impl<S: RecordStore> Orchestrator<S> {
    pub fn new(runner: TaskRunner, store: S, settings: BatchSettings) -> Self {
        Self {
            runner,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs every batch to completion
    pub async fn run(&mut self, all_urls: Vec<String>) -> Result<RunState, HarvestError> {
        self.run_until(all_urls, std::future::pending::<()>()).await
    }

    /// Runs batches until done or until `shutdown` resolves
    ///
    /// When `shutdown` fires mid-batch, the in-flight batch is dropped unsaved
    /// and the returned state has `interrupted` set.
    ///
    /// # Returns
    ///
    /// * `Ok(RunState)` - Counters for the run, including already-done URLs
    /// * `Err(HarvestError)` - The record store could not be read or written
    pub async fn run_until<F>(&mut self, all_urls: Vec<String>, shutdown: F) -> Result<RunState, HarvestError>
    where
        F: Future<Output = ()>,
    {
        let mut state = RunState::new();
        let all_urls = dedupe_preserving_order(all_urls);
        state.total_urls = all_urls.len();

        let mut records = self.store.load()?;
        let checkpoint = checkpoint_urls(&records);
        let remaining = remaining_urls(&all_urls, &checkpoint);

        state.already_done = state.total_urls - remaining.len();
        state.backlog = remaining.len();
        state.persisted_total = records.len();

        tracing::info!(
            "{} URLs total, {} already scraped, {} remaining",
            state.total_urls,
            state.already_done,
            state.backlog
        );

        if remaining.is_empty() {
            tracing::info!("Nothing to scrape");
            return Ok(state);
        }

        let batch_size = self.settings.batch_size.max(1);
        let batches: Vec<&[String]> = remaining.chunks(batch_size).collect();
        state.batches_total = batches.len();

        tokio::pin!(shutdown);

        for (index, batch) in batches.into_iter().enumerate() {
            tracing::info!(
                "Batch {}/{}: scraping {} URLs",
                index + 1,
                state.batches_total,
                batch.len()
            );

            let mut work = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::warn!(
                        "Interrupted during batch {}/{}; its progress is discarded",
                        index + 1,
                        state.batches_total
                    );
                    state.interrupted = true;
                    break;
                }
                work = self.prepare_batch(batch) => work,
            };

            records.extend(std::mem::take(&mut work.successes));
            self.store.save(&records)?;
            work.advance(BatchPhase::Done);
            state.record_batch(&work.tally, records.len());

            tracing::info!(
                "Batch {}/{} saved: {} new, {} skipped, {} records on disk ({})",
                index + 1,
                state.batches_total,
                work.tally.succeeded,
                work.tally.skipped,
                records.len(),
                self.store.describe()
            );
        }

        Ok(state)
    }

    /// Takes a batch from `Attempt` up to `Commit`
    async fn prepare_batch(&self, urls: &[String]) -> BatchWork {
        let mut work = BatchWork::new(urls);

        loop {
            match work.phase {
                BatchPhase::Attempt => {
                    work.outcomes = self.runner.run(&work.urls, self.settings.concurrency).await;
                    work.advance(BatchPhase::IdentifyGaps);
                }
                BatchPhase::IdentifyGaps => {
                    let outcomes = std::mem::take(&mut work.outcomes);
                    let (successes, gaps) = partition(&work.urls, outcomes);
                    work.successes = successes;
                    work.gaps = gaps;
                    work.tally.succeeded = work.successes.len();

                    if work.gaps.is_empty() {
                        work.advance(BatchPhase::Commit);
                    } else {
                        work.advance(BatchPhase::RetryGaps);
                    }
                }
                BatchPhase::RetryGaps => {
                    let gaps = std::mem::take(&mut work.gaps);
                    tracing::info!(
                        "Retrying {} failed URLs with concurrency {}",
                        gaps.len(),
                        self.settings.retry_concurrency
                    );

                    let outcomes = self.runner.run(&gaps, self.settings.retry_concurrency).await;
                    let (recovered, still_failed) = partition(&gaps, outcomes);

                    if !still_failed.is_empty() {
                        tracing::warn!("{} URLs failed after retry (skipped)", still_failed.len());
                        for url in &still_failed {
                            tracing::debug!("Skipped: {}", url);
                        }
                    }

                    work.tally.retried = gaps.len();
                    work.tally.recovered = recovered.len();
                    work.tally.skipped = still_failed.len();
                    work.tally.succeeded += recovered.len();
                    work.successes.extend(recovered);
                    work.advance(BatchPhase::Commit);
                }
                BatchPhase::Commit | BatchPhase::Done => return work,
            }
        }
    }
}

/// Splits outcomes into successes (in `urls` order) and the URLs that have none
///
/// A URL counts as failed unless some outcome for it is a `Success`. Outcomes
/// for URLs outside `urls` are ignored.
fn partition(urls: &[String], outcomes: Vec<TaskOutcome>) -> (Vec<ScrapedRecord>, Vec<String>) {
    let mut succeeded: HashMap<String, ScrapedRecord> = HashMap::new();
    for outcome in outcomes {
        if let TaskOutcome::Success(record) = outcome {
            succeeded.entry(record.url.clone()).or_insert(record);
        }
    }

    let mut seen = HashSet::new();
    let mut successes = Vec::new();
    let mut gaps = Vec::new();

    for url in urls {
        if !seen.insert(url.as_str()) {
            continue;
        }
        match succeeded.remove(url) {
            Some(record) => successes.push(record),
            None => gaps.push(url.clone()),
        }
    }

    (successes, gaps)
}
