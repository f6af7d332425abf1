//! Selector helpers shared by the HTML listing scrapers.
//!
//! Listing pages change markup without notice, so each field is looked up
//! through a [`SelectorChain`]: an ordered list of CSS selectors, usually
//! class-substring matches (`[class*="title"]`) with plain tag fallbacks,
//! where the first selector that finds something wins.

use crate::error::FetchError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Ordered fallback list of selectors for one field.
#[derive(Debug)]
pub struct SelectorChain(Vec<Selector>);

impl SelectorChain {
    pub fn parse(patterns: &[&str]) -> Result<Self, FetchError> {
        patterns
            .iter()
            .map(|p| Selector::parse(p).map_err(|_| FetchError::Selector((*p).to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Matches of the first selector that matches anything under `scope`.
    pub fn select_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.0
            .iter()
            .map(|s| scope.select(s).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// Same as [`select_all`](Self::select_all) over a whole document.
    pub fn select_document<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        self.select_all(document.root_element())
    }

    /// First element, across the chain, whose text is not blank.
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.0
            .iter()
            .flat_map(|s| scope.select(s))
            .map(element_text)
            .find(|t| !t.is_empty())
    }

    /// First non-blank value of `attr`, across the chain.
    pub fn first_attr(&self, scope: ElementRef<'_>, attr: &str) -> Option<String> {
        self.0
            .iter()
            .flat_map(|s| scope.select(s))
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Texts of every match of the first matching selector.
    pub fn all_texts(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.select_all(scope)
            .into_iter()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Text content of an element with whitespace runs collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve `href` against the page URL, dropping non-HTTP schemes.
pub fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let resolved = base.join(href.trim()).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
