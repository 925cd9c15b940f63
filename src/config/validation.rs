use crate::config::types::{
    Config, IngestConfig, OutputConfig, ScraperConfig, SiteConfig, MAX_URL_CACHE_AGE_HOURS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    validate_ingest_config(&config.ingest)?;
    Ok(())
}

/// Validates the target site description
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if config.sitemap_paths.is_empty() {
        return Err(ConfigError::Validation(
            "sitemap_paths must list at least one path".to_string(),
        ));
    }

    for path in &config.sitemap_paths {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "sitemap path '{}' must start with '/'",
                path
            )));
        }
    }

    if config.content_sections.is_empty() {
        return Err(ConfigError::Validation(
            "content_sections must list at least one section".to_string(),
        ));
    }

    for section in &config.content_sections {
        validate_section(section)?;
    }

    if !config.content_sections.contains(&config.series_section) {
        return Err(ConfigError::Validation(format!(
            "series_section '{}' must be one of the content_sections",
            config.series_section
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scrape pipeline tuning
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.concurrency < 1 || config.concurrency > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 64, got {}",
            config.concurrency
        )));
    }

    if config.retry_concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_concurrency must be >= 1, got {}",
            config.retry_concurrency
        )));
    }

    if config.pacing_min_ms > config.pacing_max_ms {
        return Err(ConfigError::Validation(format!(
            "pacing_min_ms ({}) cannot exceed pacing_max_ms ({})",
            config.pacing_min_ms, config.pacing_max_ms
        )));
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "page_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.marker_wait_secs < 1 {
        return Err(ConfigError::Validation(
            "marker_wait_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output file locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.scraped_path.is_empty() {
        return Err(ConfigError::Validation(
            "scraped_path cannot be empty".to_string(),
        ));
    }

    if config.url_cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "url_cache_path cannot be empty".to_string(),
        ));
    }

    if config.scraped_path == config.url_cache_path {
        return Err(ConfigError::Validation(
            "scraped_path and url_cache_path must differ".to_string(),
        ));
    }

    if let Some(hours) = config.url_cache_max_age_hours {
        if hours > MAX_URL_CACHE_AGE_HOURS {
            return Err(ConfigError::Validation(format!(
                "url_cache_max_age_hours must be <= {}, got {}",
                MAX_URL_CACHE_AGE_HOURS, hours
            )));
        }
    }

    Ok(())
}

/// Validates ingestion settings
fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    validate_http_url("api_url", &config.api_url)?;

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.progress_every < 1 {
        return Err(ConfigError::Validation(
            "progress_every must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a value parses as an http(s) URL
pub(crate) fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            field, value
        )));
    }

    Ok(())
}

/// Validates a single content section name (one path segment)
fn validate_section(section: &str) -> Result<(), ConfigError> {
    if section.is_empty() {
        return Err(ConfigError::Validation(
            "content section cannot be empty".to_string(),
        ));
    }

    if section.contains('/') || section.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "content section '{}' must be a single path segment",
            section
        )));
    }

    Ok(())
}
