//! Statistics over a scraped record file
//!
//! This module provides functionality for summarizing what a scrape produced
//! and how complete each optional field is.

use crate::storage::{RecordStore, ScrapedRecord};
use crate::url::ContentType;
use crate::HarvestError;

/// Scraped file statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeStatistics {
    /// Total number of records
    pub total_records: usize,

    pub movies: usize,
    pub series: usize,

    /// How many records carry each optional field, in record field order
    pub field_presence: Vec<(&'static str, usize)>,
}

impl ScrapeStatistics {
    /// Tallies `records`
    pub fn from_records(records: &[ScrapedRecord]) -> Self {
        let mut stats = Self {
            total_records: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.content_type {
                ContentType::Movie => stats.movies += 1,
                ContentType::Series => stats.series += 1,
            }

            for (i, (name, present)) in record.optional_fields().into_iter().enumerate() {
                if stats.field_presence.len() <= i {
                    stats.field_presence.push((name, 0));
                }
                if present {
                    stats.field_presence[i].1 += 1;
                }
            }
        }

        stats
    }

    /// Percentage of records carrying `count` values
    fn percentage(&self, count: usize) -> f64 {
        if self.total_records > 0 {
            (count as f64 / self.total_records as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from a record store
///
/// # Returns
///
/// * `Ok(ScrapeStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - The store could not be read
pub fn load_statistics(store: &dyn RecordStore) -> Result<ScrapeStatistics, HarvestError> {
    let records = store.load()?;
    Ok(ScrapeStatistics::from_records(&records))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Overview:");
    println!("  Total records: {}", stats.total_records);
    println!(
        "  Movies: {} ({:.1}%)",
        stats.movies,
        stats.percentage(stats.movies)
    );
    println!(
        "  TV Series: {} ({:.1}%)",
        stats.series,
        stats.percentage(stats.series)
    );
    println!();

    if stats.total_records == 0 {
        return;
    }

    println!("Field Coverage:");
    for (name, count) in &stats.field_presence {
        println!(
            "  {:<12} {:>7} ({:.1}%)",
            name,
            count,
            stats.percentage(*count)
        );
    }
}
