//! Sitemap-driven URL discovery
//!
//! Candidate sitemap paths are tried in order. Each candidate is walked
//! breadth-first through any nested indexes, every sitemap fetched at most
//! once. The first candidate that yields content URLs wins.

use crate::config::SiteConfig;
use crate::crawler::build_http_client;
use crate::discovery::{DiscoveryError, UrlSource};
use crate::url::{dedupe_preserving_order, ContentFilter};
use crate::HarvestError;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use url::Url;

const SITEMAP_TIMEOUT: Duration = Duration::from_secs(15);

/// A parsed sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Page URLs from a `<urlset>`
    pub pages: Vec<String>,

    /// Child sitemap URLs from a `<sitemapindex>`
    pub children: Vec<String>,
}

/// Parses a sitemap or sitemap index
///
/// Relative `<loc>` values are resolved against `base`. A document that is a
/// `<sitemapindex>` yields only children; anything else yields only pages.
pub fn parse_sitemap(base: &str, xml: &[u8]) -> Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut in_loc = false;
    let mut locs: Vec<String> = Vec::new();
    let mut saw_urlset = false;
    let mut saw_sitemapindex = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.name();
                if name.as_ref().ends_with(b"urlset") {
                    saw_urlset = true;
                } else if name.as_ref().ends_with(b"sitemapindex") {
                    saw_sitemapindex = true;
                } else if name.as_ref().ends_with(b"loc") {
                    in_loc = true;
                }
            }
            Event::End(e) => {
                if e.name().as_ref().ends_with(b"loc") {
                    in_loc = false;
                }
            }
            Event::Text(t) if in_loc => {
                locs.push(t.unescape()?.trim().to_string());
            }
            Event::CData(c) if in_loc => {
                locs.push(String::from_utf8_lossy(&c.into_inner()).trim().to_string());
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let base_url = Url::parse(base).ok();
    let resolve = |loc: String| -> String {
        if let Ok(parsed) = Url::parse(&loc) {
            parsed.to_string()
        } else if let Some(b) = &base_url {
            b.join(&loc).map(|u| u.to_string()).unwrap_or(loc)
        } else {
            loc
        }
    };

    let locs = locs.into_iter().filter(|l| !l.is_empty()).map(resolve);

    if saw_sitemapindex && !saw_urlset {
        Ok(SitemapDocument {
            pages: Vec::new(),
            children: locs.collect(),
        })
    } else {
        Ok(SitemapDocument {
            pages: locs.collect(),
            children: Vec::new(),
        })
    }
}

/// Discovers content URLs from a site's sitemaps
pub struct SitemapSource {
    client: Client,
    base_url: String,
    sitemap_paths: Vec<String>,
    filter: ContentFilter,
}

impl SitemapSource {
    pub fn new(client: Client, base_url: &str, sitemap_paths: Vec<String>, filter: ContentFilter) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            sitemap_paths,
            filter,
        }
    }

    /// Builds a source for the configured site
    pub fn from_site(site: &SiteConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(&site.user_agent, SITEMAP_TIMEOUT)?;
        let filter = ContentFilter::from_site(site)?;
        Ok(Self::new(client, &site.base_url, site.sitemap_paths.clone(), filter))
    }

    /// Candidate sitemap URLs in the order they are tried
    pub fn candidates(&self) -> Vec<String> {
        self.sitemap_paths
            .iter()
            .map(|path| format!("{}{}", self.base_url, path))
            .collect()
    }

    async fn fetch(&self, url: &str) -> Result<SitemapDocument, DiscoveryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DiscoveryError::Fetch {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| DiscoveryError::Fetch {
            url: url.to_string(),
            source,
        })?;

        parse_sitemap(url, &body).map_err(|e| DiscoveryError::Malformed {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Walks one candidate and every sitemap nested under it
    async fn walk(&self, root: &str, seen: &mut HashSet<String>) -> Vec<String> {
        let mut pages = Vec::new();
        let mut queue = VecDeque::from([root.to_string()]);
        seen.insert(root.to_string());

        while let Some(sitemap_url) = queue.pop_front() {
            tracing::debug!("Fetching sitemap {}", sitemap_url);

            let document = match self.fetch(&sitemap_url).await {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Skipping sitemap: {}", e);
                    continue;
                }
            };

            if !document.children.is_empty() {
                tracing::info!(
                    "Sitemap index {} lists {} child sitemaps",
                    sitemap_url,
                    document.children.len()
                );
            }

            for child in document.children {
                if seen.insert(child.clone()) {
                    queue.push_back(child);
                }
            }

            let before = pages.len();
            pages.extend(self.filter.filter(document.pages));
            if pages.len() > before {
                tracing::debug!("{} content URLs from {}", pages.len() - before, sitemap_url);
            }
        }

        pages
    }
}

#[async_trait]
impl UrlSource for SitemapSource {
    async fn discover(&self) -> Vec<String> {
        let mut seen = HashSet::new();

        for candidate in self.candidates() {
            if seen.contains(&candidate) {
                continue;
            }

            tracing::info!("Trying sitemap {}", candidate);
            let pages = self.walk(&candidate, &mut seen).await;

            if !pages.is_empty() {
                let urls = dedupe_preserving_order(pages);
                tracing::info!("Found {} unique content URLs via {}", urls.len(), candidate);
                return urls;
            }
        }

        tracing::warn!("No sitemap candidate produced any content URLs");
        Vec::new()
    }
}
