//! URL discovery module
//!
//! This module supplies the ordered, deduplicated list of content URLs a run
//! works through:
//! - `SitemapSource` walks a site's sitemaps (indexes and URL sets)
//! - `UrlCache` persists a discovered list between runs
//! - `load_or_discover` prefers the cache and falls back to a fresh discovery
//!
//! Discovery fails soft: fetch and parse problems are logged and yield fewer
//! (possibly zero) URLs, never an error.

mod cache;
mod sitemap;

pub use cache::UrlCache;
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapSource};

use crate::HarvestError;
use async_trait::async_trait;
use thiserror::Error;

/// Problems fetching or reading a single sitemap
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to fetch {url}: {source}")]
    Fetch { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed sitemap {url}: {message}")]
    Malformed { url: String, message: String },
}

/// Anything that can produce the list of content URLs to scrape
#[async_trait]
pub trait UrlSource: Send + Sync {
    /// Returns content URLs in discovery order, without duplicates
    ///
    /// An empty list means there is nothing to do.
    async fn discover(&self) -> Vec<String>;
}

/// Returns the cached URL list, or discovers a fresh one and caches it
///
/// The cache is bypassed when `refresh` is set or it is older than its max
/// age. An empty discovery result is returned but not cached.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - URLs to scrape, possibly empty
/// * `Err(HarvestError)` - The cache file exists but could not be read or written
pub async fn load_or_discover(
    cache: &UrlCache,
    source: &dyn UrlSource,
    refresh: bool,
) -> Result<Vec<String>, HarvestError> {
    if refresh {
        tracing::info!("Ignoring URL cache at {} (refresh requested)", cache.path().display());
    } else if let Some(urls) = cache.load()? {
        tracing::info!("Loaded {} URLs from cache {}", urls.len(), cache.path().display());
        return Ok(urls);
    }

    tracing::info!("Discovering URLs from sitemaps");
    let urls = source.discover().await;

    if urls.is_empty() {
        tracing::warn!("Discovery found no content URLs; cache left untouched");
        return Ok(urls);
    }

    cache.store(&urls)?;
    tracing::info!("Cached {} URLs to {}", urls.len(), cache.path().display());
    Ok(urls)
}
