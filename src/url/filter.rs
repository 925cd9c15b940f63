use crate::config::SiteConfig;
use crate::url::ContentType;
use crate::UrlError;
use regex::Regex;
use url::Url;

/// Recognizes content-item URLs of the form `/<section>/<slug>`
///
/// Listing and category pages (`/movie`, `/movie/`, `/genre/action`,
/// `/movie/<slug>/watch`) are rejected. The check runs on the parsed path, so
/// query strings and fragments do not affect the outcome.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    pattern: Regex,
    series_section: String,
}

impl ContentFilter {
    /// Builds a filter accepting `/<section>/<slug>` for each of `sections`
    ///
    /// # Examples
    ///
    /// ```
    /// use movie_harvester::url::{ContentFilter, ContentType};
    ///
    /// let filter = ContentFilter::new(&["movie".to_string(), "tv".to_string()], "tv").unwrap();
    /// assert!(filter.is_content_url("https://example.org/movie/heat-1995"));
    /// assert!(!filter.is_content_url("https://example.org/genre/drama"));
    /// assert_eq!(filter.content_type("https://example.org/tv/lost-42"), ContentType::Series);
    /// ```
    pub fn new(sections: &[String], series_section: &str) -> Result<Self, UrlError> {
        if sections.is_empty() {
            return Err(UrlError::Pattern("no content sections given".to_string()));
        }

        let alternatives = sections
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"^/(?:{})/[^/]+$", alternatives))
            .map_err(|e| UrlError::Pattern(e.to_string()))?;

        Ok(Self {
            pattern,
            series_section: series_section.to_string(),
        })
    }

    /// Builds the filter described by the site configuration
    pub fn from_site(site: &SiteConfig) -> Result<Self, UrlError> {
        Self::new(&site.content_sections, &site.series_section)
    }

    /// Returns true if `url` is an http(s) URL pointing at a single content item
    pub fn is_content_url(&self, url: &str) -> bool {
        match Url::parse(url.trim()) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
                self.pattern.is_match(parsed.path())
            }
            _ => false,
        }
    }

    /// Keeps only the content URLs, preserving order
    pub fn filter<I>(&self, urls: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        urls.into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| self.is_content_url(u))
            .collect()
    }

    /// Derives the content type from the first path segment
    ///
    /// Unparseable URLs fall back to `Movie`.
    pub fn content_type(&self, url: &str) -> ContentType {
        let section = Url::parse(url)
            .ok()
            .and_then(|u| {
                u.path_segments()
                    .and_then(|mut segments| segments.next().map(str::to_string))
            });

        match section {
            Some(section) if section == self.series_section => ContentType::Series,
            _ => ContentType::Movie,
        }
    }
}
