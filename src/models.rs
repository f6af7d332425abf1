//! Data models for scraped maritime news items and stored records.
//!
//! This module defines the two shapes an article takes during a run:
//! - [`RawItem`]: What a source extractor pulls out of a feed or listing page
//! - [`ArticleRecord`]: The normalized row written to the CSV store
//!
//! The column layout of the store is fixed by [`COLUMNS`]; the order of the
//! fields in [`ArticleRecord::as_row`] must match it.

use serde::{Deserialize, Serialize};

/// Header of the CSV store, in column order.
pub const COLUMNS: [&str; 8] = [
    "title",
    "link",
    "creator",
    "pubdate",
    "category",
    "description",
    "source",
    "scrape_timestamp",
];

/// An article as extracted from a source, before any cleanup.
///
/// Every textual field still carries whatever the source emitted: HTML
/// entities, markup in the description, mis-decoded punctuation and a
/// free-form date string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    /// Headline as published.
    pub title: String,
    /// Article URL. Items without one are dropped during normalization.
    pub link: String,
    /// Zero or more author names.
    pub creators: Vec<String>,
    /// Publication date exactly as the source formats it.
    pub pubdate: String,
    /// Structured categories/tags, possibly a single delimited string.
    pub categories: Vec<String>,
    /// Summary or full text, possibly HTML.
    pub description: String,
}

/// A normalized article, one row of the CSV store.
///
/// `link` is the deduplication key: the store never holds two rows with the
/// same link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    /// Cleaned headline.
    pub title: String,
    /// Article URL, the dedup key.
    pub link: String,
    /// Comma-joined author names, may be empty.
    pub creator: String,
    /// `DD/MM/YYYY HH:MM:SS` in the target timezone, the original string if
    /// it could not be parsed, or empty.
    pub pubdate: String,
    /// Comma-joined categories, may be empty.
    pub category: String,
    /// Plain-text description, may be empty.
    pub description: String,
    /// Label of the source the article came from.
    pub source: String,
    /// Timestamp of the run that produced this record.
    pub scrape_timestamp: String,
}

impl ArticleRecord {
    /// Field values in [`COLUMNS`] order.
    pub fn as_row(&self) -> [&str; 8] {
        [
            &self.title,
            &self.link,
            &self.creator,
            &self.pubdate,
            &self.category,
            &self.description,
            &self.source,
            &self.scrape_timestamp,
        ]
    }
}
