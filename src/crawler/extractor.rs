//! Field extraction from loaded content pages
//!
//! This module turns a page's markup into a `ScrapedRecord`:
//! - Essential markers decide whether the page rendered at all
//! - Every other field is extracted independently and may be absent
//! - Field-level problems become diagnostics, never record failures

use crate::crawler::session::LoadedPage;
use crate::crawler::TaskError;
use crate::storage::ScrapedRecord;
use crate::url::ContentFilter;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Delimiter for multi-value fields
pub const LIST_DELIMITER: &str = ", ";

/// Turns a loaded page into a record
pub trait Extractor: Send + Sync {
    /// Extracts a record, or fails only when the page lacks its essential markers
    fn extract(&self, page: &LoadedPage) -> Result<ScrapedRecord, TaskError>;
}

/// A problem with one field; the field is left unset
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{field}: labelled row has no value")]
    Empty { field: &'static str },

    #[error("{field}: {message}")]
    Unusable { field: &'static str, message: String },
}

/// CSS selectors for one site template
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub title: String,
    pub description: String,
    pub poster: String,
    pub rating: String,
    pub info_row: String,
    pub row_link: String,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            title: ".heading-name".to_string(),
            description: ".description".to_string(),
            poster: "img.film-poster-img".to_string(),
            rating: ".btn-imdb".to_string(),
            info_row: ".row-line".to_string(),
            row_link: "a".to_string(),
        }
    }
}

struct CompiledSelectors {
    title: Selector,
    description: Selector,
    poster: Selector,
    rating: Selector,
    info_row: Selector,
    row_link: Selector,
}

/// Which record field a labelled info row fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowField {
    Released,
    Duration,
    Genre,
    Country,
    Cast,
    Production,
}

impl RowField {
    /// Labels in match priority order
    const LABELS: [(&'static str, RowField); 6] = [
        ("Released:", RowField::Released),
        ("Duration:", RowField::Duration),
        ("Genre:", RowField::Genre),
        ("Country:", RowField::Country),
        ("Casts:", RowField::Cast),
        ("Production:", RowField::Production),
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Released => "released",
            Self::Duration => "duration",
            Self::Genre => "genre",
            Self::Country => "country",
            Self::Cast => "cast",
            Self::Production => "production",
        }
    }

    /// Multi-value rows prefer their link texts over the raw row text
    fn is_list(&self) -> bool {
        matches!(self, Self::Genre | Self::Country | Self::Production)
    }
}

/// Selector-driven extractor for movie and series pages
pub struct MovieExtractor {
    selectors: CompiledSelectors,
    filter: ContentFilter,
}

impl MovieExtractor {
    /// Compiles `selectors`; fails if any of them is not valid CSS
    pub fn new(selectors: &SelectorSet, filter: ContentFilter) -> Result<Self, HarvestError> {
        Ok(Self {
            selectors: CompiledSelectors {
                title: compile(&selectors.title)?,
                description: compile(&selectors.description)?,
                poster: compile(&selectors.poster)?,
                rating: compile(&selectors.rating)?,
                info_row: compile(&selectors.info_row)?,
                row_link: compile(&selectors.row_link)?,
            },
            filter,
        })
    }

    /// Extracts a record and returns the field diagnostics alongside it
    pub fn extract_with_diagnostics(
        &self,
        page: &LoadedPage,
    ) -> Result<(ScrapedRecord, Vec<FieldError>), TaskError> {
        let document = Html::parse_document(&page.body);
        let s = &self.selectors;

        if document.select(&s.title).next().is_none()
            && document.select(&s.description).next().is_none()
        {
            return Err(TaskError::MissingMarkers);
        }

        let mut record = ScrapedRecord::new(&page.url, self.filter.content_type(&page.url));
        let mut diagnostics = Vec::new();

        record.title = first_text(&document, &s.title);
        record.rating = first_text(&document, &s.rating);
        record.description = first_text(&document, &s.description);

        match self.extract_poster(&document, page) {
            Ok(poster) => record.image_url = poster,
            Err(e) => diagnostics.push(e),
        }

        for row in document.select(&s.info_row) {
            let text = collapse_whitespace(&row.text().collect::<String>());
            let Some((label, field)) = RowField::LABELS
                .iter()
                .find(|(label, _)| text.contains(label))
                .copied()
            else {
                continue;
            };

            match self.extract_row(row, &text, label, field) {
                Ok(value) => assign(&mut record, field, value),
                Err(e) => diagnostics.push(e),
            }
        }

        Ok((record, diagnostics))
    }

    /// Reads the poster URL from `src`, falling back to the lazy-load `data-src`
    fn extract_poster(&self, document: &Html, page: &LoadedPage) -> Result<Option<String>, FieldError> {
        let Some(img) = document.select(&self.selectors.poster).next() else {
            return Ok(None);
        };

        let src = img
            .value()
            .attr("src")
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.starts_with("data:"))
            .or_else(|| {
                img.value()
                    .attr("data-src")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            });

        let Some(src) = src else {
            return Err(FieldError::Unusable {
                field: "image_url",
                message: "poster has neither src nor data-src".to_string(),
            });
        };

        // Relative poster paths resolve against the page that served them
        match Url::parse(&page.final_url).and_then(|base| base.join(src)) {
            Ok(resolved) => Ok(Some(resolved.to_string())),
            Err(_) => Ok(Some(src.to_string())),
        }
    }

    fn extract_row(
        &self,
        row: ElementRef<'_>,
        text: &str,
        label: &str,
        field: RowField,
    ) -> Result<Option<String>, FieldError> {
        let stripped = collapse_whitespace(&text.replace(label, ""));

        if field.is_list() {
            let items: Vec<String> = row
                .select(&self.selectors.row_link)
                .map(|a| collapse_whitespace(&a.text().collect::<String>()))
                .filter(|t| !t.is_empty())
                .collect();
            if !items.is_empty() {
                return Ok(Some(items.join(LIST_DELIMITER)));
            }
        }

        if field == RowField::Cast && stripped == "N/A" {
            return Ok(None);
        }

        if stripped.is_empty() {
            return Err(FieldError::Empty { field: field.name() });
        }

        Ok(Some(stripped))
    }
}

impl Extractor for MovieExtractor {
    fn extract(&self, page: &LoadedPage) -> Result<ScrapedRecord, TaskError> {
        let (record, diagnostics) = self.extract_with_diagnostics(page)?;
        for diagnostic in &diagnostics {
            tracing::warn!("Field extraction problem on {}: {}", page.url, diagnostic);
        }
        Ok(record)
    }
}

fn assign(record: &mut ScrapedRecord, field: RowField, value: Option<String>) {
    let slot = match field {
        RowField::Released => &mut record.released,
        RowField::Duration => &mut record.duration,
        RowField::Genre => &mut record.genre,
        RowField::Country => &mut record.country,
        RowField::Cast => &mut record.cast,
        RowField::Production => &mut record.production,
    };
    *slot = value;
}

fn compile(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css).map_err(|e| HarvestError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Text of the first element matching `selector`, whitespace collapsed
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Collapses runs of whitespace and newlines into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
