//! Crawler module for page scraping and batch orchestration
//!
//! This module contains the core scraping logic, including:
//! - Isolated page sessions, one per task
//! - Field extraction from loaded pages
//! - A bounded, paced task runner
//! - The checkpointed batch orchestrator

mod extractor;
mod gate;
mod orchestrator;
mod outcome;
mod runner;
mod session;

pub use extractor::{collapse_whitespace, Extractor, FieldError, MovieExtractor, SelectorSet, LIST_DELIMITER};
pub use gate::{Admission, AdmissionGate};
pub use orchestrator::{BatchSettings, Orchestrator};
pub use outcome::{TaskError, TaskOutcome};
pub use runner::{Pacing, TaskRunner};
pub use session::{build_http_client, HttpSessionConfig, HttpSessionFactory, LoadedPage, PageSession, SessionFactory};

use crate::config::Config;
use crate::storage::JsonFileStore;
use crate::url::ContentFilter;
use crate::HarvestError;
use std::sync::Arc;

/// Builds the production task runner from configuration
///
/// Sessions navigate within `page-timeout-secs` and wait up to
/// `marker-wait-secs` for the page body.
pub fn build_runner(config: &Config) -> Result<TaskRunner, HarvestError> {
    let sessions = HttpSessionFactory::new(HttpSessionConfig {
        user_agent: config.site.user_agent.clone(),
        navigation_timeout: config.scraper.page_timeout(),
        content_timeout: config.scraper.marker_wait(),
    });

    let filter = ContentFilter::from_site(&config.site)?;
    let extractor = MovieExtractor::new(&SelectorSet::default(), filter)?;

    Ok(TaskRunner::from_config(
        &config.scraper,
        Arc::new(sessions),
        Arc::new(extractor),
    ))
}

/// Builds an orchestrator writing to the configured output file
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(Orchestrator)` - Ready to run
/// * `Err(HarvestError)` - The content pattern or a selector was invalid
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator<JsonFileStore>, HarvestError> {
    let runner = build_runner(config)?;
    let store = JsonFileStore::new(&config.output.scraped_path);

    Ok(Orchestrator::new(
        runner,
        store,
        BatchSettings::from_config(&config.scraper),
    ))
}
