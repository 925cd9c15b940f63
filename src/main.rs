//! Movie-Harvester main entry point
//!
//! This is the command-line interface for the resumable movie metadata scraper.

use anyhow::Context;
use clap::Parser;
use movie_harvester::config::{load_config_with_hash, Config};
use movie_harvester::crawler::build_orchestrator;
use movie_harvester::discovery::{load_or_discover, SitemapSource, UrlCache};
use movie_harvester::output::{format_elapsed, load_statistics, print_ingest_report, print_run_summary, print_statistics};
use movie_harvester::sink::{HttpSink, Ingestor, RetryPolicy};
use movie_harvester::storage::{checkpoint_urls, remaining_urls, JsonFileStore, RecordStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Movie-Harvester: a resumable movie metadata scraper
///
/// Discovers content pages from the site's sitemaps, scrapes them in
/// checkpointed batches, and can forward the results to an ingestion API.
/// Stop at any time with Ctrl+C and run again to resume.
#[derive(Parser, Debug)]
#[command(name = "movie-harvester")]
#[command(version)]
#[command(about = "A resumable movie metadata scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Send scraped records to the ingestion API instead of scraping
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    ingest: bool,

    /// Show statistics for the scraped file and exit
    #[arg(long, conflicts_with_all = ["ingest", "dry_run"])]
    stats: bool,

    /// Validate config and show what would be scraped without touching the network
    #[arg(long, conflicts_with_all = ["ingest", "stats"])]
    dry_run: bool,

    /// Ignore the URL cache and rediscover from the sitemaps
    #[arg(long)]
    refresh_urls: bool,

    /// Maximum number of new records to ingest
    #[arg(long, requires = "ingest")]
    limit: Option<usize>,

    /// Ingestion API base URL (overrides the config file)
    #[arg(long, value_name = "URL")]
    api: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let started = Instant::now();
    let result = run(cli).await;
    println!("\nTime: {}", format_elapsed(started.elapsed()));

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(api) = cli.api {
        config
            .override_api_url(api)
            .context("invalid --api override")?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
        Ok(ExitCode::SUCCESS)
    } else if cli.stats {
        handle_stats(&config)?;
        Ok(ExitCode::SUCCESS)
    } else if cli.ingest {
        handle_ingest(&config, cli.limit).await
    } else {
        handle_scrape(&config, cli.refresh_urls).await?;
        Ok(ExitCode::SUCCESS)
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("movie_harvester=info,warn"),
            1 => EnvFilter::new("movie_harvester=debug,info"),
            2 => EnvFilter::new("movie_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Resolves once the operator presses Ctrl+C
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Movie-Harvester Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Sitemaps: {}", config.site.sitemap_paths.join(", "));
    println!(
        "  Content sections: {} (series: {})",
        config.site.content_sections.join(", "),
        config.site.series_section
    );

    println!("\nScraper:");
    println!("  Batch size: {}", config.scraper.batch_size);
    println!("  Concurrency: {}", config.scraper.concurrency);
    println!(
        "  Retry concurrency: {}",
        config.scraper.effective_retry_concurrency()
    );
    println!(
        "  Pacing: {}-{}ms",
        config.scraper.pacing_min_ms, config.scraper.pacing_max_ms
    );

    println!("\nOutput:");
    println!("  Scraped file: {}", config.output.scraped_path);
    println!("  URL cache: {}", config.output.url_cache_path);

    println!("\nIngest:");
    println!("  API: {}", config.ingest.api_url);

    let store = JsonFileStore::new(&config.output.scraped_path);
    let records = store
        .load()
        .with_context(|| format!("failed to read {}", store.describe()))?;
    let checkpoint = checkpoint_urls(&records);

    let cache = UrlCache::new(
        &config.output.url_cache_path,
        config.output.url_cache_max_age(),
    );
    println!("\n✓ Configuration is valid");
    println!("✓ {} records already scraped", checkpoint.len());

    match cache.load()? {
        Some(urls) => {
            let backlog = remaining_urls(&urls, &checkpoint);
            println!("✓ {} URLs cached, {} left to scrape", urls.len(), backlog.len());
        }
        None => println!("✓ No usable URL cache; the next run will discover from sitemaps"),
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics for the scraped file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Scraped file: {}\n", config.output.scraped_path);

    let store = JsonFileStore::new(&config.output.scraped_path);
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, refresh_urls: bool) -> anyhow::Result<()> {
    let cache = UrlCache::new(
        &config.output.url_cache_path,
        config.output.url_cache_max_age(),
    );
    let source = SitemapSource::from_site(&config.site)?;
    let urls = load_or_discover(&cache, &source, refresh_urls).await?;

    if urls.is_empty() {
        println!("No content URLs found. Nothing to do.");
        return Ok(());
    }

    let mut orchestrator = build_orchestrator(config)?;
    println!("Stop anytime with Ctrl+C; run again to resume.");

    let state = orchestrator
        .run_until(urls, interrupted())
        .await
        .context("scrape run failed")?;

    print_run_summary(&state);
    Ok(())
}

/// Handles the --ingest mode: forwards scraped records to the ingestion API
async fn handle_ingest(config: &Config, limit: Option<usize>) -> anyhow::Result<ExitCode> {
    let store = JsonFileStore::new(&config.output.scraped_path);
    if !store.path().exists() {
        println!(
            "No {} found. Run a scrape first.",
            config.output.scraped_path
        );
        return Ok(ExitCode::SUCCESS);
    }

    let records = store
        .load()
        .with_context(|| format!("failed to read {}", store.describe()))?;

    let sink = HttpSink::from_config(&config.ingest).context("failed to build sink client")?;
    tracing::info!("Ingesting into {}", sink.api_url());
    let ingestor = Ingestor::new(
        Arc::new(sink),
        RetryPolicy::from_config(&config.ingest),
        config.ingest.progress_every,
    );

    let report = tokio::select! {
        report = ingestor.run(&records, limit) => report,
        _ = interrupted() => {
            println!("\n\nStopped. Run again to resume.");
            return Ok(ExitCode::SUCCESS);
        }
    };

    print_ingest_report(&report);

    if report.all_failed() {
        eprintln!(
            "\nERROR: 0 out of {} records ingested; the backend may be unreachable.",
            report.total
        );
        return Ok(ExitCode::from(1));
    }

    Ok(ExitCode::SUCCESS)
}
