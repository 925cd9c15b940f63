use crate::config::IngestConfig;
use crate::sink::SinkError;
use rand::Rng;
use std::time::Duration;

/// Upper bound on any single backoff delay
const MAX_BACKOFF_MS: u64 = 60_000;

/// Doubling delay with a cap and optional jitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
    jitter_percent: u64,
}

impl ExponentialBackoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            jitter_percent: 10,
        }
    }

    /// Adds up to `jitter_percent` of the delay on top of it
    pub fn with_jitter(mut self, jitter_percent: u64) -> Self {
        self.jitter_percent = jitter_percent;
        self
    }

    /// Delay before retry number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        let capped = exponential.min(self.max_ms);
        let jitter = if self.jitter_percent > 0 {
            rand::thread_rng().gen_range(0..=capped.saturating_mul(self.jitter_percent) / 100)
        } else {
            0
        };
        Duration::from_millis(capped + jitter)
    }
}

/// How often and how long to wait between sink attempts
///
/// Rate-limited responses use their own, longer schedule but share the same
/// attempt ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: ExponentialBackoff,
    pub rate_limit_backoff: ExponentialBackoff,
}

impl RetryPolicy {
    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: ExponentialBackoff::new(config.backoff_base_ms, MAX_BACKOFF_MS),
            rate_limit_backoff: ExponentialBackoff::new(
                config.rate_limit_backoff_ms,
                MAX_BACKOFF_MS.max(config.rate_limit_backoff_ms),
            ),
        }
    }

    /// Delay after failed attempt number `attempt` (1-based), or `None` to give up
    pub fn next_delay(&self, attempt: u32, error: &SinkError) -> Option<Duration> {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return None;
        }

        let schedule = if error.is_rate_limited() {
            &self.rate_limit_backoff
        } else {
            &self.backoff
        };
        Some(schedule.delay(attempt - 1))
    }
}
