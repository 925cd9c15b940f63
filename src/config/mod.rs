//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use movie_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Scraping {} pages at a time", config.scraper.concurrency);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, IngestConfig, OutputConfig, ScraperConfig, SiteConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
