use crate::config::validation::validate_http_url;
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Replaces the ingestion API URL, applying the same checks as the file value
    pub fn override_api_url(&mut self, api_url: String) -> Result<(), ConfigError> {
        validate_http_url("api_url", &api_url)?;
        self.ingest.api_url = api_url;
        Ok(())
    }
}

/// Target site description
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host of the site, e.g. "https://example.org"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Sitemap locations tried in order, relative to the base URL
    #[serde(rename = "sitemap-paths", default = "default_sitemap_paths")]
    pub sitemap_paths: Vec<String>,

    /// First path segments that identify content pages ("movie" for /movie/<slug>)
    #[serde(rename = "content-sections", default = "default_content_sections")]
    pub content_sections: Vec<String>,

    /// The content section whose pages are series rather than movies
    #[serde(rename = "series-section", default = "default_series_section")]
    pub series_section: String,

    /// User agent sent by page sessions and the sitemap client
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Scrape pipeline tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Number of backlog URLs processed and checkpointed together
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of page sessions open at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Concurrency used for the single retry pass over a batch's failures
    #[serde(rename = "retry-concurrency", default = "default_retry_concurrency")]
    pub retry_concurrency: usize,

    /// Lower bound of the randomized delay before each page load (milliseconds)
    #[serde(rename = "pacing-min-ms", default = "default_pacing_min_ms")]
    pub pacing_min_ms: u64,

    /// Upper bound of the randomized delay before each page load (milliseconds)
    #[serde(rename = "pacing-max-ms", default = "default_pacing_max_ms")]
    pub pacing_max_ms: u64,

    /// Deadline for a page request through its response headers (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Extra time a page may take to deliver its body after the headers (seconds)
    #[serde(rename = "marker-wait-secs", default = "default_marker_wait_secs")]
    pub marker_wait_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
            retry_concurrency: default_retry_concurrency(),
            pacing_min_ms: default_pacing_min_ms(),
            pacing_max_ms: default_pacing_max_ms(),
            page_timeout_secs: default_page_timeout_secs(),
            marker_wait_secs: default_marker_wait_secs(),
        }
    }
}

impl ScraperConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn marker_wait(&self) -> Duration {
        Duration::from_secs(self.marker_wait_secs)
    }

    /// Retry passes never run wider than the main pass
    pub fn effective_retry_concurrency(&self) -> usize {
        self.retry_concurrency.min(self.concurrency).max(1)
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// JSON array of scraped records; doubles as the checkpoint
    #[serde(rename = "scraped-path", default = "default_scraped_path")]
    pub scraped_path: String,

    /// JSON array of discovered content URLs
    #[serde(rename = "url-cache-path", default = "default_url_cache_path")]
    pub url_cache_path: String,

    /// Rediscover when the cache file is older than this; absent means never
    #[serde(rename = "url-cache-max-age-hours", default)]
    pub url_cache_max_age_hours: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scraped_path: default_scraped_path(),
            url_cache_path: default_url_cache_path(),
            url_cache_max_age_hours: None,
        }
    }
}

/// Longest accepted URL cache age: ten years
pub const MAX_URL_CACHE_AGE_HOURS: u64 = 24 * 365 * 10;

impl OutputConfig {
    pub fn url_cache_max_age(&self) -> Option<Duration> {
        self.url_cache_max_age_hours
            .map(|hours| Duration::from_secs(hours.saturating_mul(60 * 60)))
    }
}

/// Downstream ingestion API settings
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(rename = "api-url", default = "default_api_url")]
    pub api_url: String,

    /// Attempts per record, including the first
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Base delay used instead of `backoff-base-ms` after a 429
    #[serde(rename = "rate-limit-backoff-ms", default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "progress-every", default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            progress_every: default_progress_every(),
        }
    }
}

fn default_sitemap_paths() -> Vec<String> {
    ["/sitemap.xml", "/sitemap_index.xml", "/post-sitemap.xml", "/movie-sitemap.xml"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn default_content_sections() -> Vec<String> {
    vec!["movie".to_string(), "tv".to_string()]
}

fn default_series_section() -> String {
    "tv".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_concurrency() -> usize {
    3
}

fn default_retry_concurrency() -> usize {
    3
}

fn default_pacing_min_ms() -> u64 {
    1500
}

fn default_pacing_max_ms() -> u64 {
    4000
}

fn default_page_timeout_secs() -> u64 {
    60
}

fn default_marker_wait_secs() -> u64 {
    10
}

fn default_scraped_path() -> String {
    "scraped_movies.json".to_string()
}

fn default_url_cache_path() -> String {
    "movie_urls_cache.json".to_string()
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_rate_limit_backoff_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_progress_every() -> usize {
    50
}
