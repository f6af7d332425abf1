//! Error types for the three places a run can go wrong.
//!
//! None of these are fatal to a run except a [`ConfigError`] raised while
//! loading an explicitly requested config file. Fetch errors cost one source,
//! store errors are logged and the run carries on.

use thiserror::Error;

/// Failure to retrieve or parse a single source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("feed parse error: {0}")]
    Feed(#[from] rss::Error),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("invalid source URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure to read, migrate or append to the CSV store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure to load the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown timezone `{0}`")]
    Timezone(String),
}

/// An append that failed part-way; carries how many rows it tried to add.
#[derive(Debug, Error)]
#[error("failed to append {attempted} new records: {source}")]
pub struct AppendError {
    pub attempted: usize,
    #[source]
    pub source: StoreError,
}
