//! RSS 2.0 feeds.
//!
//! Most maritime outlets run WordPress, so their feeds look alike: Dublin
//! Core creators, one `<category>` per tag, an HTML excerpt in
//! `<description>` and sometimes the whole article in `content:encoded`.
//!
//! A feed that does not parse as a whole (a mismatched tag, a body cut off
//! mid-item) still yields the complete `<item>` elements that precede the
//! damage: they are cut out of the raw body and parsed one by one.

use super::Extractor;
use crate::config::{SourceConfig, SourceKind};
use crate::error::FetchError;
use crate::models::RawItem;
use quick_xml::Reader;
use quick_xml::events::Event;
use rss::{Channel, Item};
use tracing::{debug, warn};

/// Root used for salvaged items when the feed's own `<rss>` tag was not seen.
const BARE_RSS_OPEN: &str = r#"<rss version="2.0">"#;

/// A source read from an RSS feed.
#[derive(Debug, Clone)]
pub struct RssSource {
    name: String,
    url: String,
    full_text: bool,
}

impl RssSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            full_text: config.full_text,
        }
    }
}

impl Extractor for RssSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Rss
    }

    fn extract(&self, body: &str) -> Result<Vec<RawItem>, FetchError> {
        match Channel::read_from(body.as_bytes()) {
            Ok(channel) => {
                debug!(entries = channel.items().len(), "Parsed feed");
                Ok(self.raw_items(channel.items()))
            }
            Err(e) => {
                let salvaged = salvage_items(body);
                if salvaged.is_empty() {
                    return Err(e.into());
                }
                warn!(
                    error = %e,
                    salvaged = salvaged.len(),
                    "Malformed feed; keeping the items before the damage"
                );
                Ok(self.raw_items(&salvaged))
            }
        }
    }
}

impl RssSource {
    fn raw_items(&self, entries: &[Item]) -> Vec<RawItem> {
        let mut items = Vec::with_capacity(entries.len());
        for (index, item) in entries.iter().enumerate() {
            match raw_item(item, self.full_text) {
                Some(raw) => items.push(raw),
                None => warn!(index, title = ?item.title(), "Feed item has no link; skipping"),
            }
        }
        items
    }
}

/// Complete `<item>` elements of a feed that failed to parse, up to the
/// first XML error.
///
/// Each item is re-parsed inside a copy of the feed's `<rss>` start tag so
/// namespace prefixes like `dc:` still resolve.
fn salvage_items(body: &str) -> Vec<Item> {
    let mut reader = Reader::from_str(body);
    let mut rss_open = BARE_RSS_OPEN;
    let mut item_start = None;
    let mut items = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(tag)) => match tag.name().as_ref() {
                b"rss" => rss_open = &body[before..reader.buffer_position() as usize],
                b"item" => item_start = Some(before),
                _ => {}
            },
            Ok(Event::End(tag)) if tag.name().as_ref() == b"item" => {
                let Some(start) = item_start.take() else {
                    continue;
                };
                let chunk = &body[start..reader.buffer_position() as usize];
                match parse_item(rss_open, chunk) {
                    Ok(Some(item)) => items.push(item),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Unparsable feed item; skipping"),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, position = reader.error_position(), "Feed XML error; stopping salvage");
                break;
            }
            Ok(_) => {}
        }
    }
    items
}

fn parse_item(rss_open: &str, chunk: &str) -> Result<Option<Item>, rss::Error> {
    let document = format!("{rss_open}<channel>{chunk}</channel></rss>");
    let channel = Channel::read_from(document.as_bytes())?;
    Ok(channel.items().first().cloned())
}

/// Creators come from `dc:creator`, falling back to `<author>`.
fn creators(item: &Item) -> Vec<String> {
    let dc: Vec<String> = item
        .dublin_core_ext()
        .map(|dc| dc.creators().to_vec())
        .unwrap_or_default();
    if !dc.is_empty() {
        return dc;
    }
    item.author().map(|a| vec![a.to_string()]).unwrap_or_default()
}

fn pubdate(item: &Item) -> String {
    item.pub_date()
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.dates().first().map(String::as_str))
        })
        .unwrap_or_default()
        .to_string()
}

fn raw_item(item: &Item, full_text: bool) -> Option<RawItem> {
    let link = item.link().map(str::trim).filter(|l| !l.is_empty())?;

    let description = if full_text {
        item.content().or(item.description())
    } else {
        item.description().or(item.content())
    };

    Some(RawItem {
        title: item.title().unwrap_or_default().to_string(),
        link: link.to_string(),
        creators: creators(item),
        pubdate: pubdate(item),
        categories: item.categories().iter().map(|c| c.name().to_string()).collect(),
        description: description.unwrap_or_default().to_string(),
    })
}
