/// Phase definitions for one batch of the scrape pipeline
///
/// A batch moves through attempt, gap detection, an optional retry of the
/// gaps, and a commit that makes it durable.
use std::fmt;

/// Represents where a batch is in its attempt/retry/commit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchPhase {
    /// Every batch URL is being scraped at full concurrency
    Attempt,

    /// Outcomes are being partitioned into successes and gaps
    IdentifyGaps,

    /// The gaps are being scraped once more at reduced concurrency
    RetryGaps,

    /// Successes are being merged into the record set and persisted
    Commit,

    /// The batch is durable
    Done,
}

impl BatchPhase {
    /// Returns true if `next` may follow this phase
    ///
    /// `IdentifyGaps` goes straight to `Commit` when the attempt left no gaps.
    pub fn can_transition_to(&self, next: BatchPhase) -> bool {
        matches!(
            (self, next),
            (Self::Attempt, Self::IdentifyGaps)
                | (Self::IdentifyGaps, Self::RetryGaps)
                | (Self::IdentifyGaps, Self::Commit)
                | (Self::RetryGaps, Self::Commit)
                | (Self::Commit, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attempt => "attempt",
            Self::IdentifyGaps => "identify_gaps",
            Self::RetryGaps => "retry_gaps",
            Self::Commit => "commit",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
