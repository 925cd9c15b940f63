//! Bounded task runner
//!
//! This module runs one scrape task per URL:
//! - At most `concurrency` tasks hold a session at any instant
//! - Every task waits a randomized pacing delay before navigating
//! - A failing task becomes a `Failure` outcome and never stops its siblings
//!
//! `run` returns once every submitted URL has an outcome.

use crate::config::ScraperConfig;
use crate::crawler::extractor::Extractor;
use crate::crawler::gate::AdmissionGate;
use crate::crawler::session::SessionFactory;
use crate::crawler::{TaskError, TaskOutcome};
use crate::storage::ScrapedRecord;
use rand::Rng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Log a progress line after this many completed tasks
const PROGRESS_INTERVAL: usize = 10;

/// Bounded uniform delay applied before each navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (min_ms, max_ms) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min: Duration::from_millis(min_ms),
            max: Duration::from_millis(max_ms),
        }
    }

    /// No delay at all
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    /// Draws one delay from `[min, max]`
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::thread_rng()
            .gen_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// Outcomes accumulated by concurrent tasks
#[derive(Default)]
struct Collected {
    outcomes: Vec<TaskOutcome>,
    succeeded: usize,
    failed: usize,
}

/// Runs scrape tasks under an admission gate
#[derive(Clone)]
pub struct TaskRunner {
    sessions: Arc<dyn SessionFactory>,
    extractor: Arc<dyn Extractor>,
    pacing: Pacing,
    task_timeout: Duration,
}

impl TaskRunner {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        extractor: Arc<dyn Extractor>,
        pacing: Pacing,
        task_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            extractor,
            pacing,
            task_timeout,
        }
    }

    /// Builds a runner whose pacing and deadline come from the scraper settings
    ///
    /// The task deadline covers navigation plus waiting for content.
    pub fn from_config(
        config: &ScraperConfig,
        sessions: Arc<dyn SessionFactory>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        Self::new(
            sessions,
            extractor,
            Pacing::new(config.pacing_min_ms, config.pacing_max_ms),
            config.page_timeout() + config.marker_wait(),
        )
    }

    /// Scrapes `urls` with at most `concurrency` tasks in flight
    ///
    /// Returns exactly one outcome per input URL, in completion order.
    pub async fn run(&self, urls: &[String], concurrency: usize) -> Vec<TaskOutcome> {
        if urls.is_empty() {
            return Vec::new();
        }

        let gate = AdmissionGate::new(concurrency);
        let collected = Arc::new(Mutex::new(Collected::default()));
        let started = Instant::now();
        let total = urls.len();
        let mut tasks = JoinSet::new();

        tracing::debug!("Running {} tasks with concurrency {}", total, gate.capacity());

        for url in urls {
            let url = url.clone();
            let gate = gate.clone();
            let sessions = Arc::clone(&self.sessions);
            let extractor = Arc::clone(&self.extractor);
            let collected = Arc::clone(&collected);
            let pacing = self.pacing;
            let task_timeout = self.task_timeout;

            tasks.spawn(async move {
                let outcome = match gate.admit().await {
                    Ok(_admission) => {
                        tokio::time::sleep(pacing.sample()).await;
                        let result = tokio::time::timeout(
                            task_timeout,
                            scrape_one(sessions.as_ref(), extractor.as_ref(), &url),
                        )
                        .await;
                        match result {
                            Ok(Ok(record)) => TaskOutcome::Success(record),
                            Ok(Err(reason)) => TaskOutcome::Failure { url, reason },
                            Err(_) => TaskOutcome::Failure {
                                url,
                                reason: TaskError::Timeout(task_timeout),
                            },
                        }
                    }
                    Err(reason) => TaskOutcome::Failure { url, reason },
                };

                if let TaskOutcome::Failure { url, reason } = &outcome {
                    tracing::warn!("Failed to scrape {}: {}", url, reason);
                }

                let mut guard = lock(&collected);
                if outcome.is_success() {
                    guard.succeeded += 1;
                } else {
                    guard.failed += 1;
                }
                guard.outcomes.push(outcome);

                let done = guard.outcomes.len();
                if done % PROGRESS_INTERVAL == 0 {
                    let rate = done as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                    tracing::info!(
                        "Progress: {}/{} attempted, {} succeeded, {} failed, {:.2} pages/sec",
                        done,
                        total,
                        guard.succeeded,
                        guard.failed,
                        rate
                    );
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Scrape task ended abnormally: {}", e);
            }
        }

        let mut outcomes = std::mem::take(&mut lock(&collected).outcomes);

        // A task that panicked never recorded its outcome
        if outcomes.len() < total {
            let seen: HashSet<String> = outcomes.iter().map(|o| o.url().to_string()).collect();
            for url in urls {
                if !seen.contains(url) {
                    outcomes.push(TaskOutcome::Failure {
                        url: url.clone(),
                        reason: TaskError::Aborted,
                    });
                }
            }
        }

        outcomes
    }
}

/// One task body; the session is dropped before this returns on every path
async fn scrape_one(
    sessions: &dyn SessionFactory,
    extractor: &dyn Extractor,
    url: &str,
) -> Result<ScrapedRecord, TaskError> {
    let mut session = sessions.open().await?;
    let page = session.load(url).await?;
    drop(session);

    extractor.extract(&page)
}

/// Locks the shared outcome list, recovering from a poisoned lock
fn lock(collected: &Mutex<Collected>) -> MutexGuard<'_, Collected> {
    collected.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
