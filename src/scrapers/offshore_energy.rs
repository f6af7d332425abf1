//! Offshore Energy news listing scraper.
//!
//! `offshore-energy.biz/news/` is a WordPress archive: one `<article>` per
//! post, ISO timestamps in `<time datetime>`, and the post's categories as
//! tag links. Older theme versions used `card` list items instead, so both
//! layouts are tried.

use super::Extractor;
use super::html::{SelectorChain, element_text, resolve_link};
use crate::config::{SourceConfig, SourceKind};
use crate::error::FetchError;
use crate::models::RawItem;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

const CARDS: &[&str] = &["article", "li[class*=\"card\"]", "div[class*=\"card\"]"];
const TITLE_LINK: &[&str] = &[
    "h2 a[href]",
    "h3 a[href]",
    "[class*=\"title\"] a[href]",
    "a[class*=\"title\"][href]",
];
const AUTHOR: &[&str] = &["[class*=\"author\"] a", "[class*=\"author\"]", "[rel=\"author\"]"];
const DATETIME: &[&str] = &["time[datetime]"];
const DATE_TEXT: &[&str] = &["time", "[class*=\"date\"]"];
const CATEGORY: &[&str] = &[
    "[class*=\"category\"] a",
    "[class*=\"tags\"] a",
    "[rel~=\"tag\"]",
];
const SUMMARY: &[&str] = &["[class*=\"excerpt\"]", "[class*=\"summary\"]", "p"];

/// Offshore Energy listing page.
#[derive(Debug, Clone)]
pub struct OffshoreEnergySource {
    name: String,
    url: String,
}

impl OffshoreEnergySource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
        }
    }
}

struct Selectors {
    cards: SelectorChain,
    title_link: SelectorChain,
    author: SelectorChain,
    datetime: SelectorChain,
    date_text: SelectorChain,
    category: SelectorChain,
    summary: SelectorChain,
}

impl Selectors {
    fn parse() -> Result<Self, FetchError> {
        Ok(Self {
            cards: SelectorChain::parse(CARDS)?,
            title_link: SelectorChain::parse(TITLE_LINK)?,
            author: SelectorChain::parse(AUTHOR)?,
            datetime: SelectorChain::parse(DATETIME)?,
            date_text: SelectorChain::parse(DATE_TEXT)?,
            category: SelectorChain::parse(CATEGORY)?,
            summary: SelectorChain::parse(SUMMARY)?,
        })
    }
}

impl Extractor for OffshoreEnergySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn kind(&self) -> SourceKind {
        SourceKind::OffshoreEnergy
    }

    fn extract(&self, body: &str) -> Result<Vec<RawItem>, FetchError> {
        let base = Url::parse(&self.url)?;
        let selectors = Selectors::parse()?;
        let document = Html::parse_document(body);

        let cards = selectors.cards.select_document(&document);
        debug!(cards = cards.len(), "Found listing cards");

        let mut items = Vec::with_capacity(cards.len());
        for (index, card) in cards.into_iter().enumerate() {
            match card_item(card, &selectors, &base) {
                Some(item) => items.push(item),
                None => warn!(index, "Listing card without a title link; skipping"),
            }
        }
        Ok(items)
    }
}

fn card_item(card: ElementRef<'_>, selectors: &Selectors, base: &Url) -> Option<RawItem> {
    let anchor = selectors.title_link.select_all(card).into_iter().next()?;
    let link = resolve_link(base, anchor.value().attr("href")?)?;

    let pubdate = selectors
        .datetime
        .first_attr(card, "datetime")
        .or_else(|| selectors.date_text.first_text(card))
        .unwrap_or_default();

    Some(RawItem {
        title: element_text(anchor),
        link,
        creators: selectors.author.first_text(card).into_iter().collect(),
        pubdate,
        categories: selectors.category.all_texts(card),
        description: selectors.summary.first_text(card).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<html><body><div class="archive">
      <article class="post">
        <h2 class="entry-title"><a href="https://www.offshore-energy.biz/first-floating-wind-array/">First floating wind array energized</a></h2>
        <time datetime="2025-08-22T09:05:00+02:00">August 22, 2025</time>
        <span class="author"><a href="/author/jane">Jane Doe</a></span>
        <div class="category-links"><a href="/wind">Wind</a><a href="/floating">Floating</a></div>
        <div class="excerpt"><p>The 100 MW project &#8211; a first for the region.</p></div>
      </article>
      <article class="post">
        <h2 class="entry-title"><a href="/vessel-orders-climb/">Vessel orders climb</a></h2>
        <span class="date">August 21, 2025</span>
      </article>
      <article class="promo"><p>Subscribe to our newsletter</p></article>
    </div></body></html>"#;

    fn source() -> OffshoreEnergySource {
        OffshoreEnergySource::new(&SourceConfig {
            name: "Offshore Energy".to_string(),
            url: "https://www.offshore-energy.biz/news/".to_string(),
            kind: SourceKind::OffshoreEnergy,
            full_text: false,
        })
    }

    #[test]
    fn test_extract_articles() {
        let items = source().extract(LISTING).unwrap();
        assert_eq!(items.len(), 2, "promo block is skipped");

        let first = &items[0];
        assert_eq!(first.title, "First floating wind array energized");
        assert_eq!(first.pubdate, "2025-08-22T09:05:00+02:00");
        assert_eq!(first.creators, vec!["Jane Doe"]);
        assert_eq!(first.categories, vec!["Wind", "Floating"]);
        assert_eq!(first.description, "The 100 MW project \u{2013} a first for the region.");

        let second = &items[1];
        assert_eq!(second.link, "https://www.offshore-energy.biz/vessel-orders-climb/");
        assert_eq!(second.pubdate, "August 21, 2025");
        assert!(second.categories.is_empty());
    }

    #[test]
    fn test_default_date_hint_is_name() {
        assert_eq!(source().date_hint(), "Offshore Energy");
    }
}
