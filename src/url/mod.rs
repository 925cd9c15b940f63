//! URL handling module
//!
//! This module decides which sitemap entries are content pages, derives the
//! content type from a URL's path shape, and deduplicates URL lists.

mod filter;

pub use filter::ContentFilter;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of content a page describes, derived from its URL rather than its markup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    #[serde(rename = "Movie")]
    Movie,

    #[serde(rename = "TV Series")]
    Series,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Series => "TV Series",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Removes repeated URLs, keeping the first occurrence of each
///
/// # Examples
///
/// ```
/// use movie_harvester::url::dedupe_preserving_order;
///
/// let urls = vec!["a".to_string(), "b".to_string(), "a".to_string()];
/// assert_eq!(dedupe_preserving_order(urls), vec!["a", "b"]);
/// ```
pub fn dedupe_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
