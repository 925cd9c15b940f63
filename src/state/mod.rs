//! State module for tracking scrape progress
//!
//! # Components
//!
//! - `BatchPhase`: where a batch is in its attempt/retry/commit cycle
//! - `RunState`: counters owned by the orchestrator and returned as the run summary
//! - `BatchTally`: per-batch counts folded into `RunState` at commit

mod batch_phase;
mod run_state;

pub use batch_phase::BatchPhase;
pub use run_state::{BatchTally, RunState};
