//! Seatrade Maritime news listing scraper.
//!
//! The listing at `seatrade-maritime.com/news` renders one preview card per
//! story. Child class names carry build hashes (`ListPreview-Title_abc12`),
//! so fields are matched on class-name substrings with tag fallbacks.
//!
//! Dates are printed as `22 August 2025 14:31 GMT`; the trailing
//! abbreviation is handled by the date standardizer through
//! [`TZ_ABBREVIATION_SOURCE`].

use super::Extractor;
use super::html::{SelectorChain, element_text, resolve_link};
use crate::config::{SourceConfig, SourceKind};
use crate::dates::TZ_ABBREVIATION_SOURCE;
use crate::error::FetchError;
use crate::models::RawItem;
use scraper::{ElementRef, Html};
use tracing::{debug, warn};
use url::Url;

const CARDS: &[&str] = &[
    "div.ListPreview",
    "div[class*=\"article-card\"]",
    "article",
];
const TITLE_LINK: &[&str] = &[
    "[class*=\"Title\"] a[href]",
    "a[class*=\"Title\"][href]",
    "[class*=\"title\"] a[href]",
    "h3 a[href]",
    "h2 a[href]",
];
const ANY_LINK: &[&str] = &["a[href]"];
/// Tag and topic links; never the story itself.
const TAXONOMY_LINK: &[&str] = &[
    "[class*=\"Keyword\"] a[href], a[class*=\"Keyword\"][href], [class*=\"category\"] a[href], a[class*=\"category\"][href]",
];
const AUTHOR: &[&str] = &["[class*=\"Author\"]", "[class*=\"author\"]", "[class*=\"byline\"]"];
const DATE: &[&str] = &["[class*=\"Date\"]", "[class*=\"date\"]", "time"];
const CATEGORY: &[&str] = &[
    "[class*=\"Keyword\"]",
    "[class*=\"category\"] a",
    "[class*=\"category\"]",
    "[class*=\"topic\"]",
];
const SUMMARY: &[&str] = &[
    "[class*=\"Summary\"]",
    "[class*=\"summary\"]",
    "[class*=\"excerpt\"]",
    "p",
];

/// Seatrade Maritime listing page.
#[derive(Debug, Clone)]
pub struct SeatradeSource {
    name: String,
    url: String,
}

impl SeatradeSource {
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
    any_link: SelectorChain,
    taxonomy_link: SelectorChain,
    author: SelectorChain,
    date: SelectorChain,
    category: SelectorChain,
    summary: SelectorChain,
}

impl Selectors {
    fn parse() -> Result<Self, FetchError> {
        Ok(Self {
            cards: SelectorChain::parse(CARDS)?,
            title_link: SelectorChain::parse(TITLE_LINK)?,
            any_link: SelectorChain::parse(ANY_LINK)?,
            taxonomy_link: SelectorChain::parse(TAXONOMY_LINK)?,
            author: SelectorChain::parse(AUTHOR)?,
            date: SelectorChain::parse(DATE)?,
            category: SelectorChain::parse(CATEGORY)?,
            summary: SelectorChain::parse(SUMMARY)?,
        })
    }
}

impl Extractor for SeatradeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Seatrade
    }

    fn date_hint(&self) -> &str {
        TZ_ABBREVIATION_SOURCE
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
                None => warn!(index, "Listing card without a usable link; skipping"),
            }
        }
        Ok(items)
    }
}

fn card_item(card: ElementRef<'_>, selectors: &Selectors, base: &Url) -> Option<RawItem> {
    let anchor = selectors
        .title_link
        .select_all(card)
        .into_iter()
        .next()
        .or_else(|| {
            let taxonomy: Vec<_> = selectors
                .taxonomy_link
                .select_all(card)
                .into_iter()
                .map(|a| a.id())
                .collect();
            selectors
                .any_link
                .select_all(card)
                .into_iter()
                .find(|a| !taxonomy.contains(&a.id()))
        })?;
    let link = resolve_link(base, anchor.value().attr("href")?)?;

    Some(RawItem {
        title: element_text(anchor),
        link,
        creators: selectors.author.first_text(card).into_iter().collect(),
        pubdate: selectors.date.first_text(card).unwrap_or_default(),
        categories: selectors.category.all_texts(card),
        description: selectors.summary.first_text(card).unwrap_or_default(),
    })
}
