//! Run configuration.
//!
//! Everything that used to be a module-level constant lives here: the store
//! path, the target timezone, HTTP politeness settings and the ordered list
//! of sources. A built-in default covers the whole cycle; a YAML file can
//! override any part of it.
//!
//! # Example
//!
//! ```yaml
//! store_path: /var/lib/maritime/articles.csv
//! timezone: Europe/London
//! politeness_delay_secs: 5
//! sources:
//!   - name: Splash247
//!     url: https://splash247.com/feed/
//!     kind: rss
//!   - name: Seatrade Maritime
//!     url: https://www.seatrade-maritime.com/news
//!     kind: seatrade
//! ```

use crate::error::ConfigError;
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Desktop-browser agent sent to HTML listing pages.
pub const DEFAULT_BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// How a source is retrieved and parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS 2.0 feed.
    Rss,
    /// Seatrade Maritime news listing page.
    Seatrade,
    /// Offshore Energy news listing page.
    OffshoreEnergy,
}

impl SourceKind {
    /// Whether the source is an HTML page (and so wants a browser agent).
    pub fn is_html(self) -> bool {
        !matches!(self, SourceKind::Rss)
    }
}

/// One configured source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    /// Label written to the `source` column.
    pub name: String,
    /// Feed or listing page URL.
    pub url: String,
    pub kind: SourceKind,
    /// For RSS: prefer `content:encoded` over `<description>`.
    #[serde(default)]
    pub full_text: bool,
}

impl SourceConfig {
    fn new(name: &str, url: &str, kind: SourceKind) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            kind,
            full_text: false,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CSV store location.
    pub store_path: PathBuf,
    /// IANA timezone every timestamp is converted to.
    pub timezone: String,
    /// Pause between consecutive sources.
    pub politeness_delay_secs: u64,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// `User-Agent` for HTML sources.
    pub browser_user_agent: String,
    /// Sources in fetch order.
    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("rss_feed_articles.csv"),
            timezone: "Asia/Singapore".to_string(),
            politeness_delay_secs: 2,
            request_timeout_secs: 30,
            browser_user_agent: DEFAULT_BROWSER_USER_AGENT.to_string(),
            sources: default_sources(),
        }
    }
}

/// The built-in source list, in priority order.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new("Splash247", "https://splash247.com/feed/", SourceKind::Rss),
        SourceConfig::new("gCaptain", "https://gcaptain.com/feed/", SourceKind::Rss),
        SourceConfig::new(
            "Hellenic Shipping News",
            "https://www.hellenicshippingnews.com/feed/",
            SourceKind::Rss,
        ),
        SourceConfig::new(
            "Seatrade Maritime",
            "https://www.seatrade-maritime.com/news",
            SourceKind::Seatrade,
        ),
        SourceConfig::new(
            "Offshore Energy",
            "https://www.offshore-energy.biz/news/",
            SourceKind::OffshoreEnergy,
        ),
    ]
}

impl Config {
    /// Load the configuration, starting from defaults.
    ///
    /// With `path` set the YAML file must exist and parse; fields it leaves
    /// out keep their defaults. The timezone is validated either way.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let config = Self::from_yaml(&raw)?;
                info!(path = %path.display(), sources = config.sources.len(), "Loaded configuration file");
                config
            }
            None => Self::default(),
        };
        config.tz()?;
        Ok(config)
    }

    /// Parse a YAML document on top of the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The target timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::Timezone(self.timezone.clone()))
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_secs(self.politeness_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store_path, PathBuf::from("rss_feed_articles.csv"));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.sources.len(), 5);
        assert_eq!(config.sources[0].name, "Splash247");
        assert!(config.tz().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("timezone: Europe/London\npoliteness_delay_secs: 0\n").unwrap();
        assert_eq!(config.timezone, "Europe/London");
        assert_eq!(config.politeness_delay(), Duration::ZERO);
        assert_eq!(config.sources, default_sources());
    }

    #[test]
    fn test_yaml_sources() {
        let yaml = r#"
sources:
  - name: gCaptain
    url: https://gcaptain.com/feed/
    kind: rss
    full_text: true
  - name: Offshore Energy
    url: https://www.offshore-energy.biz/news/
    kind: offshore_energy
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert!(config.sources[0].full_text);
        assert_eq!(config.sources[1].kind, SourceKind::OffshoreEnergy);
        assert!(config.sources[1].kind.is_html());
        assert!(!config.sources[0].kind.is_html());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timezone: Atlantis/Lost").unwrap();
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Timezone(ref tz) if tz == "Atlantis/Lost"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Config::load(Some(Path::new("/nonexistent/maritime.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
