//! One complete collection run.
//!
//! The run is strictly sequential: migrate the store, load the links it
//! already holds, fetch each source in priority order with a politeness
//! delay in between, normalize every item and append what is new. Nothing
//! in here fails the run; every problem is logged and the run carries on
//! with whatever it has.

use crate::dates::{format_timestamp, standardize_date};
use crate::models::{ArticleRecord, RawItem};
use crate::scrapers::{Extractor, Fetcher};
use crate::store::{CsvStore, MigrationOutcome};
use crate::text::{clean_text, flatten_categories, strip_html};
use crate::utils::truncate_for_log;
use chrono::Utc;
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Per-run values stamped onto every record.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub tz: Tz,
    pub scrape_timestamp: String,
}

impl RunContext {
    /// Context for a run starting now.
    pub fn now(tz: Tz) -> Self {
        Self {
            tz,
            scrape_timestamp: format_timestamp(Utc::now(), tz),
        }
    }
}

/// Turn a raw item into a stored record.
///
/// Returns `None` when the item has no link, since it could never be
/// deduplicated.
pub fn normalize(raw: RawItem, source: &str, date_hint: &str, ctx: &RunContext) -> Option<ArticleRecord> {
    let link = raw.link.trim();
    if link.is_empty() {
        return None;
    }

    Some(ArticleRecord {
        title: clean_text(&raw.title),
        link: link.to_string(),
        creator: raw
            .creators
            .iter()
            .map(|c| clean_text(c))
            .filter(|c| !c.is_empty())
            .join(", "),
        pubdate: standardize_date(&clean_text(&raw.pubdate), Some(date_hint), ctx.tz),
        category: flatten_categories(&raw.categories),
        description: clean_text(&strip_html(&raw.description)),
        source: source.to_string(),
        scrape_timestamp: ctx.scrape_timestamp.clone(),
    })
}

/// How one source did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub name: String,
    /// Raw items the extractor returned.
    pub fetched: usize,
    /// Items that survived normalization.
    pub records: usize,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    /// Links in the store before this run.
    pub existing: usize,
    /// Records with a new link, written or not.
    pub attempted: usize,
    /// Records actually written.
    pub added: usize,
    /// Records dropped as duplicates.
    pub skipped: usize,
}

/// Run the whole fetch-normalize-append cycle.
#[instrument(level = "info", skip_all, fields(store = %store.path().display(), sources = extractors.len()))]
pub async fn run(
    extractors: &[Box<dyn Extractor>],
    fetcher: &Fetcher,
    store: &CsvStore,
    ctx: &RunContext,
    politeness_delay: Duration,
) -> RunSummary {
    match store.migrate_schema() {
        Ok(MigrationOutcome::Migrated { rows, added, dropped }) => {
            info!(rows, ?added, ?dropped, "Store schema migrated")
        }
        Ok(_) => {}
        Err(e) => error!(error = %e, "Store migration failed; continuing"),
    }

    let mut existing = store.load_existing_links().unwrap_or_else(|e| {
        error!(error = %e, "Error reading existing store; treating it as empty");
        HashSet::new()
    });
    let existing_count = existing.len();

    let batches: Vec<(SourceReport, Vec<ArticleRecord>)> = stream::iter(extractors.iter().enumerate())
        .then(|(i, extractor)| async move {
            if i > 0 && !politeness_delay.is_zero() {
                sleep(politeness_delay).await;
            }
            fetch_source(extractor.as_ref(), fetcher, ctx).await
        })
        .collect()
        .await;

    let mut summary = RunSummary {
        existing: existing_count,
        ..Default::default()
    };
    let mut records = Vec::new();
    for (report, batch) in batches {
        summary.sources.push(report);
        records.extend(batch);
    }

    match store.append(&records, &mut existing) {
        Ok(appended) => {
            summary.attempted = appended.added;
            summary.added = appended.added;
            summary.skipped = appended.skipped;
        }
        Err(e) => {
            error!(error = %e, attempted = e.attempted, "Error writing to store");
            summary.attempted = e.attempted;
            summary.skipped = records.len() - e.attempted;
        }
    }
    summary
}

async fn fetch_source(
    extractor: &dyn Extractor,
    fetcher: &Fetcher,
    ctx: &RunContext,
) -> (SourceReport, Vec<ArticleRecord>) {
    let raw = fetcher.fetch(extractor).await;
    let fetched = raw.len();

    let records: Vec<ArticleRecord> = raw
        .into_iter()
        .filter_map(|item| {
            let title = item.title.clone();
            let record = normalize(item, extractor.name(), extractor.date_hint(), ctx);
            if record.is_none() {
                warn!(
                    source = %extractor.name(),
                    title = %truncate_for_log(&title, 80),
                    "Item without link; skipping"
                );
            }
            record
        })
        .collect();

    info!(source = %extractor.name(), fetched, records = records.len(), "Source done");
    let report = SourceReport {
        name: extractor.name().to_string(),
        fetched,
        records: records.len(),
    };
    (report, records)
}
