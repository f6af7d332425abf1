//! Maritime news sources and the driver that fetches them.
//!
//! Every source implements [`Extractor`]: it knows its label and URL and can
//! turn a response body into [`RawItem`]s. The network side lives in
//! [`Fetcher`], which is the only place a source can fail, and which turns
//! every failure into an empty result plus a logged error.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Splash247 | [`rss_feed`] | RSS feed | |
//! | gCaptain | [`rss_feed`] | RSS feed | |
//! | Hellenic Shipping News | [`rss_feed`] | RSS feed | |
//! | Seatrade Maritime | [`seatrade`] | HTML listing | Dates end in a timezone abbreviation |
//! | Offshore Energy | [`offshore_energy`] | HTML listing | ISO dates in `<time datetime>` |

pub mod html;
pub mod offshore_energy;
pub mod rss_feed;
pub mod seatrade;

use crate::config::{Config, SourceConfig, SourceKind};
use crate::error::FetchError;
use crate::models::RawItem;
use crate::utils::truncate_for_log;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Agent sent to RSS endpoints.
pub const FEED_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One news source.
///
/// Implementations hold only their configuration and parsing rules; they
/// never touch the network. `extract` fails only when the document as a
/// whole is unusable. Items it cannot make sense of are skipped with a
/// warning so the rest of the page still counts.
pub trait Extractor {
    /// Label written to the `source` column.
    fn name(&self) -> &str;

    /// Feed or listing page URL.
    fn url(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Hint handed to the date standardizer. Defaults to the source label.
    fn date_hint(&self) -> &str {
        self.name()
    }

    /// Parse a fetched body into raw items, in document order.
    fn extract(&self, body: &str) -> Result<Vec<RawItem>, FetchError>;
}

/// Build the extractors for the configured sources, in configured order.
pub fn build_extractors(config: &Config) -> Vec<Box<dyn Extractor>> {
    config.sources.iter().map(build_extractor).collect()
}

fn build_extractor(source: &SourceConfig) -> Box<dyn Extractor> {
    match source.kind {
        SourceKind::Rss => Box::new(rss_feed::RssSource::new(source)),
        SourceKind::Seatrade => Box::new(seatrade::SeatradeSource::new(source)),
        SourceKind::OffshoreEnergy => Box::new(offshore_energy::OffshoreEnergySource::new(source)),
    }
}

/// HTTP side of source retrieval.
pub struct Fetcher {
    client: Client,
    browser_user_agent: String,
}

impl Fetcher {
    /// Build a fetcher with its own client.
    pub fn new(timeout: Duration, browser_user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(FEED_USER_AGENT)
            .build()?;
        Ok(Self::with_client(client, browser_user_agent))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client, browser_user_agent: &str) -> Self {
        Self {
            client,
            browser_user_agent: browser_user_agent.to_string(),
        }
    }

    /// Retrieve and extract one source.
    ///
    /// Never fails: transport errors, bad statuses and unparsable documents
    /// are logged and yield an empty list.
    #[instrument(level = "info", skip_all, fields(source = %extractor.name(), url = %extractor.url()))]
    pub async fn fetch(&self, extractor: &dyn Extractor) -> Vec<RawItem> {
        let body = match self.fetch_body(extractor).await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Source fetch failed");
                return Vec::new();
            }
        };
        debug!(bytes = body.len(), "Fetched source body");

        match extractor.extract(&body) {
            Ok(items) => {
                info!(count = items.len(), "Extracted items");
                items
            }
            Err(e) => {
                error!(
                    error = %e,
                    body_preview = %truncate_for_log(&body, 200),
                    "Source extraction failed"
                );
                Vec::new()
            }
        }
    }

    async fn fetch_body(&self, extractor: &dyn Extractor) -> Result<String, FetchError> {
        let mut request = self.client.get(extractor.url());
        if extractor.kind().is_html() {
            request = request.header(USER_AGENT, self.browser_user_agent.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: extractor.url().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A throw-away HTTP server for exercising [`Fetcher`] without the
    //! network.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `body` with `status` to every connection; returns the base URL.
    pub async fn serve(status: u16, content_type: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let body = body.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status} OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    /// A client that ignores proxy settings from the environment.
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// A URL nothing listens on.
    pub const DEAD_URL: &str = "http://127.0.0.1:1/feed/";
}
