//! The scraped record shape shared by the output file and the sink payload

use crate::url::ContentType;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Metadata scraped from one content page
///
/// Only `url`, `content_type` and `scraped_at` are always present. Every other
/// field depends on what the page markup offered. Records written by older
/// runs may omit optional keys entirely, so they all default to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedRecord {
    /// Source URL; the record's identity and the checkpoint key
    pub url: String,

    #[serde(rename = "type", default)]
    pub content_type: ContentType,

    /// RFC 3339 timestamp of extraction
    pub scraped_at: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Poster image URL
    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub rating: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Release date as shown on the page
    #[serde(default)]
    pub released: Option<String>,

    #[serde(default)]
    pub duration: Option<String>,

    /// Comma separated genres
    #[serde(default)]
    pub genre: Option<String>,

    /// Comma separated countries
    #[serde(default)]
    pub country: Option<String>,

    /// Comma separated cast members
    #[serde(default)]
    pub cast: Option<String>,

    /// Comma separated production companies
    #[serde(default)]
    pub production: Option<String>,
}

impl ScrapedRecord {
    /// Creates an empty record for `url`, stamped with the current time
    pub fn new(url: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            url: url.into(),
            content_type,
            scraped_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            title: None,
            image_url: None,
            rating: None,
            description: None,
            released: None,
            duration: None,
            genre: None,
            country: None,
            cast: None,
            production: None,
        }
    }

    /// Display label used in log lines
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Names and presence of each optional field, in output order
    pub fn optional_fields(&self) -> [(&'static str, bool); 10] {
        [
            ("title", self.title.is_some()),
            ("image_url", self.image_url.is_some()),
            ("rating", self.rating.is_some()),
            ("description", self.description.is_some()),
            ("released", self.released.is_some()),
            ("duration", self.duration.is_some()),
            ("genre", self.genre.is_some()),
            ("country", self.country.is_some()),
            ("cast", self.cast.is_some()),
            ("production", self.production.is_some()),
        ]
    }
}
