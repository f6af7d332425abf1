//! Command-line interface definitions.
//!
//! Every option is optional: with no arguments the full collection cycle runs
//! against the built-in sources and the default store. Both options can also
//! come from the environment, which is convenient under cron.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the maritime news collector.
///
/// # Examples
///
/// ```sh
/// # Full cycle with built-in defaults
/// maritime_news_feed
///
/// # Custom source list and store location
/// maritime_news_feed --config sources.yaml --store /var/lib/maritime/articles.csv
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, env = "MARITIME_NEWS_CONFIG")]
    pub config: Option<PathBuf>,

    /// CSV store path (overrides `store_path` from the configuration)
    #[arg(short, long, env = "MARITIME_NEWS_STORE")]
    pub store: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_arguments() {
        let cli = Cli::try_parse_from(["maritime_news_feed"]).unwrap();
        // The env fallbacks are unset in a normal test environment.
        if std::env::var_os("MARITIME_NEWS_CONFIG").is_none() {
            assert_eq!(cli.config, None);
        }
        if std::env::var_os("MARITIME_NEWS_STORE").is_none() {
            assert_eq!(cli.store, None);
        }
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "maritime_news_feed",
            "--config",
            "./sources.yaml",
            "--store",
            "./articles.csv",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("./sources.yaml")));
        assert_eq!(cli.store, Some(PathBuf::from("./articles.csv")));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["maritime_news_feed", "-c", "/tmp/c.yaml", "-s", "/tmp/a.csv"]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/a.csv")));
    }

    #[test]
    fn test_cli_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["maritime_news_feed", "--json-output-dir", "x"]).is_err());
    }
}
