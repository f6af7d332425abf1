//! The append-only CSV store and its dedup contract.
//!
//! The store is a single CSV file whose first row is [`COLUMNS`]. Normal runs
//! only ever append to it; the whole file is rewritten only when
//! [`CsvStore::migrate_schema`] finds an outdated header.
//!
//! # Dedup
//!
//! `link` is the key. [`CsvStore::append`] writes a record only if its link
//! is absent from the set returned by [`CsvStore::load_existing_links`], and
//! adds each written link to that set so repeats inside one batch are
//! dropped too.

use crate::error::{AppendError, StoreError};
use crate::models::{ArticleRecord, COLUMNS};
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Value given to the `source` column of rows written before it existed.
pub const LEGACY_SOURCE: &str = "unknown";

/// Default for a column that an older header did not have.
fn column_default(column: &str) -> &'static str {
    match column {
        "source" => LEGACY_SOURCE,
        _ => "",
    }
}

/// Result of a successful [`CsvStore::append`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppendSummary {
    /// Records whose link was new and that were written.
    pub added: usize,
    /// Records dropped because their link was already stored.
    pub skipped: usize,
}

/// What [`CsvStore::migrate_schema`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No file (or an empty one); the next append creates it.
    NoStore,
    /// Header already matches [`COLUMNS`].
    UpToDate,
    /// File rewritten with the current header.
    Migrated {
        rows: usize,
        added: Vec<String>,
        dropped: Vec<String>,
    },
}

/// Handle on the CSV file backing the archive.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_absent_or_empty(&self) -> Result<bool, StoreError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Every link already in the store. Empty when the file is absent or
    /// empty, or when its header has no `link` column.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub fn load_existing_links(&self) -> Result<HashSet<String>, StoreError> {
        let mut links = HashSet::new();
        if self.is_absent_or_empty()? {
            debug!("Store does not exist yet");
            return Ok(links);
        }

        let mut reader = ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let Some(link_idx) = reader.byte_headers()?.iter().position(|h| h == b"link") else {
            warn!("Store header has no link column; treating store as empty");
            return Ok(links);
        };

        // Only the link is decoded, so a bad byte elsewhere in a row costs
        // nothing and an unreadable row costs only that row.
        for (index, row) in reader.byte_records().enumerate() {
            match row {
                Ok(row) => {
                    if let Some(link) = row.get(link_idx).filter(|l| !l.is_empty()) {
                        links.insert(String::from_utf8_lossy(link).into_owned());
                    }
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => warn!(row = index + 1, error = %e, "Unreadable store row; skipping"),
            }
        }
        info!(count = links.len(), "Found existing articles");
        Ok(links)
    }

    /// Append the records whose link is not in `existing`, in order.
    ///
    /// The header is written first when the file is new or empty. Written
    /// links are inserted into `existing`. On failure the error carries the
    /// number of rows the call tried to add.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), batch = records.len()))]
    pub fn append(
        &self,
        records: &[ArticleRecord],
        existing: &mut HashSet<String>,
    ) -> Result<AppendSummary, AppendError> {
        let fresh: Vec<&ArticleRecord> = records
            .iter()
            .filter(|r| existing.insert(r.link.clone()))
            .collect();
        let summary = AppendSummary {
            added: fresh.len(),
            skipped: records.len() - fresh.len(),
        };

        if fresh.is_empty() {
            info!("No new articles to add");
            return Ok(summary);
        }

        self.write_rows(&fresh).map_err(|source| AppendError {
            attempted: fresh.len(),
            source,
        })?;
        info!(added = summary.added, skipped = summary.skipped, "Appended new articles");
        Ok(summary)
    }

    fn write_rows(&self, rows: &[&ArticleRecord]) -> Result<(), StoreError> {
        let needs_header = self.is_absent_or_empty()?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(COLUMNS)?;
            info!("Created new CSV file with headers");
        }
        for record in rows {
            writer.write_record(record.as_row())?;
            info!(title = %record.title, source = %record.source, "New article added");
        }
        writer.flush()?;
        Ok(())
    }

    /// Bring an outdated header up to [`COLUMNS`].
    ///
    /// Old columns are mapped by name, columns no longer in use are dropped
    /// and new ones get their default. Row order and retained values are
    /// kept. The new file is written next to the old one and renamed over
    /// it. Running it on an up-to-date store does nothing.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub fn migrate_schema(&self) -> Result<MigrationOutcome, StoreError> {
        if self.is_absent_or_empty()? {
            return Ok(MigrationOutcome::NoStore);
        }

        let mut reader = ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let old_header: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();
        if old_header == COLUMNS {
            debug!("Store header is current");
            return Ok(MigrationOutcome::UpToDate);
        }

        let mapping: Vec<Option<usize>> = COLUMNS
            .iter()
            .map(|column| old_header.iter().position(|h| h == column))
            .collect();
        let added: Vec<String> = COLUMNS
            .iter()
            .zip(&mapping)
            .filter(|(_, idx)| idx.is_none())
            .map(|(column, _)| column.to_string())
            .collect();
        let dropped: Vec<String> = old_header
            .iter()
            .filter(|h| !COLUMNS.contains(&h.as_str()))
            .cloned()
            .collect();

        let tmp = self.migration_path();
        let rows = match write_migrated(&tmp, reader.byte_records(), &mapping) {
            Ok(rows) => rows,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e);
            }
        };
        drop(reader);
        fs::rename(&tmp, &self.path)?;

        info!(rows, ?added, ?dropped, "Migrated store schema");
        Ok(MigrationOutcome::Migrated {
            rows,
            added,
            dropped,
        })
    }

    fn migration_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".migrating");
        self.path.with_file_name(name)
    }
}

fn write_migrated(
    tmp: &Path,
    records: impl Iterator<Item = csv::Result<ByteRecord>>,
    mapping: &[Option<usize>],
) -> Result<usize, StoreError> {
    let mut writer = WriterBuilder::new().from_path(tmp)?;
    writer.write_record(COLUMNS)?;

    let mut rows = 0;
    for row in records {
        let row = row?;
        let fields = COLUMNS.iter().zip(mapping).map(|(column, idx)| match idx {
            Some(i) => row.get(*i).unwrap_or(b""),
            None => column_default(column).as_bytes(),
        });
        writer.write_record(fields)?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}
