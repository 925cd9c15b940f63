//! Counters for one orchestrator run
//!
//! The orchestrator owns a single `RunState`, updates it between batches and
//! hands it back to the caller as the run summary.

/// Progress and outcome counters for one scrape run
#[derive(Debug, Clone)]
pub struct RunState {
    /// URLs supplied by the URL source after deduplication
    pub total_urls: usize,

    /// URLs already present in the checkpoint when the run started
    pub already_done: usize,

    /// URLs left to scrape when the run started
    pub backlog: usize,

    pub batches_total: usize,
    pub batches_completed: usize,

    /// Records scraped and persisted by this run
    pub newly_scraped: usize,

    /// URLs that failed the main pass
    pub retried: usize,

    /// URLs that failed the main pass and succeeded on retry
    pub recovered: usize,

    /// URLs that failed both passes and were skipped
    pub permanently_failed: usize,

    /// Size of the persisted record set after the last commit
    pub persisted_total: usize,

    /// The run stopped before every batch was committed
    pub interrupted: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            total_urls: 0,
            already_done: 0,
            backlog: 0,
            batches_total: 0,
            batches_completed: 0,
            newly_scraped: 0,
            retried: 0,
            recovered: 0,
            permanently_failed: 0,
            persisted_total: 0,
            interrupted: false,
        }
    }

    /// Records a committed batch
    pub fn record_batch(&mut self, outcome: &BatchTally, persisted_total: usize) {
        self.batches_completed += 1;
        self.newly_scraped += outcome.succeeded;
        self.retried += outcome.retried;
        self.recovered += outcome.recovered;
        self.permanently_failed += outcome.skipped;
        self.persisted_total = persisted_total;
    }

    /// True when the run found nothing to scrape
    pub fn is_noop(&self) -> bool {
        self.backlog == 0
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-batch counts produced when a batch commits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    /// URLs in the batch
    pub attempted: usize,

    /// Records committed (main pass plus retry)
    pub succeeded: usize,

    /// URLs sent to the retry pass
    pub retried: usize,

    /// Retry-pass successes
    pub recovered: usize,

    /// URLs dropped after failing both passes
    pub skipped: usize,
}
