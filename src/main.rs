//! # Maritime News Feed
//!
//! Collects maritime-industry news from RSS feeds and HTML listing pages
//! into a single deduplicated CSV archive.
//!
//! ## Usage
//!
//! ```sh
//! maritime_news_feed --store ./rss_feed_articles.csv
//! ```
//!
//! ## Architecture
//!
//! One invocation is one collection run:
//! 1. **Migration**: bring an older store up to the current column set
//! 2. **Fetching**: retrieve every source in priority order, pausing between them
//! 3. **Normalization**: clean text, flatten categories, standardize dates
//! 4. **Append**: write records whose link the store has not seen yet
//!
//! Source and store failures are logged and never abort the run; the process
//! exits 0 whenever a run took place.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod error;
mod models;
mod pipeline;
mod scrapers;
mod store;
mod text;
mod utils;

use cli::Cli;
use config::Config;
use pipeline::RunContext;
use scrapers::Fetcher;
use store::CsvStore;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("maritime_news_feed starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.store, "Parsed CLI arguments");

    // ---- Configuration ----
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(store) = args.store {
        config.store_path = store;
    }
    let tz = config.tz()?;
    info!(
        store = %config.store_path.display(),
        timezone = %tz,
        sources = config.sources.len(),
        "Configuration resolved"
    );

    // ---- Run ----
    let fetcher = Fetcher::new(config.request_timeout(), &config.browser_user_agent)?;
    let extractors = scrapers::build_extractors(&config);
    let store = CsvStore::new(config.store_path.clone());
    let ctx = RunContext::now(tz);

    let summary = pipeline::run(&extractors, &fetcher, &store, &ctx, config.politeness_delay()).await;

    for report in &summary.sources {
        info!(
            source = %report.name,
            fetched = report.fetched,
            records = report.records,
            "Source summary"
        );
    }
    info!(
        existing = summary.existing,
        attempted = summary.attempted,
        added = summary.added,
        skipped = summary.skipped,
        "Run summary"
    );
    if let Ok(json) = serde_json::to_string(&summary) {
        debug!(summary = %json, "Run summary (JSON)");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
