//! Output module for run summaries and reports
//!
//! This module handles:
//! - Printing the end-of-run scrape summary
//! - Printing ingestion results
//! - Summarizing the scraped file (`stats`)

pub mod stats;

pub use stats::{load_statistics, print_statistics, ScrapeStatistics};

use crate::sink::IngestReport;
use crate::state::RunState;
use std::time::Duration;

/// Prints the scrape run summary to stdout
pub fn print_run_summary(state: &RunState) {
    println!();
    println!("=== Scrape Summary ===");
    println!("  URLs discovered:     {}", state.total_urls);
    println!("  Already scraped:     {}", state.already_done);

    if state.is_noop() {
        println!("  Nothing left to scrape.");
        return;
    }

    println!(
        "  Batches completed:   {}/{}",
        state.batches_completed, state.batches_total
    );
    println!("  Newly scraped:       {}", state.newly_scraped);
    println!(
        "  Retried:             {} ({} recovered)",
        state.retried, state.recovered
    );
    println!("  Permanently failed:  {}", state.permanently_failed);
    println!("  Records on disk:     {}", state.persisted_total);

    if state.interrupted {
        println!();
        println!("Stopped early. Progress up to the last completed batch is saved; run again to resume.");
    }
}

/// Prints the ingestion summary to stdout
pub fn print_ingest_report(report: &IngestReport) {
    println!();
    println!("=== Ingest Summary ===");
    println!("  Scraped records:     {}", report.scraped);
    println!("  Already ingested:    {}", report.already_present);
    println!("  Submitted:           {}", report.total);
    println!("  Ingested:            {}", report.ingested);
    println!("  Unexpected skips:    {}", report.unexpected);
    println!("  Failed:              {}", report.failed);
}

/// Formats an elapsed duration as minutes, or seconds when short
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1} seconds", secs)
    } else {
        format!("{:.1} minutes", secs / 60.0)
    }
}
