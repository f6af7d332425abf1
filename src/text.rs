//! Text cleanup for everything a source hands us.
//!
//! Feeds and listing pages disagree on almost everything: some double-escape
//! entities, some serve UTF-8 that was decoded as Windows-1252 somewhere
//! upstream, some wrap summaries in markup. This module turns all of that
//! into plain Unicode text:
//!
//! - [`clean_text`]: entity decoding, mojibake repair, NFD, control-character
//!   and whitespace cleanup
//! - [`strip_html`]: markup to text
//! - [`flatten_categories`]: category lists to the stored `", "`-joined form

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use unicode_normalization::UnicodeNormalization;

/// Elements whose boundaries separate words.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "td", "th",
    "tr", "ul",
];

static RE_QUESTION_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").unwrap());

/// UTF-8 sequences that were decoded as Windows-1252/Latin-1, and what they
/// should have been. Longer patterns sharing a prefix come first.
const MOJIBAKE: &[(&str, &str)] = &[
    ("â€™", "\u{2019}"),
    ("â€˜", "\u{2018}"),
    ("â€œ", "\u{201C}"),
    ("â€\u{9d}", "\u{201D}"),
    ("â€“", "\u{2013}"),
    ("â€”", "\u{2014}"),
    ("â€¦", "\u{2026}"),
    ("â€¢", "\u{2022}"),
    ("â‚¬", "\u{20AC}"),
    ("â€", "\u{201D}"),
    ("Ã©", "é"),
    ("Ã¨", "è"),
    ("Ãª", "ê"),
    ("Ã«", "ë"),
    ("Ã¡", "á"),
    ("Ã\u{a0}", "à"),
    ("Ã¢", "â"),
    ("Ã¤", "ä"),
    ("Ã¥", "å"),
    ("Ã£", "ã"),
    ("Ã\u{ad}", "í"),
    ("Ã¬", "ì"),
    ("Ã®", "î"),
    ("Ã¯", "ï"),
    ("Ã³", "ó"),
    ("Ã²", "ò"),
    ("Ã´", "ô"),
    ("Ã¶", "ö"),
    ("Ãµ", "õ"),
    ("Ã¸", "ø"),
    ("Ãº", "ú"),
    ("Ã¹", "ù"),
    ("Ã»", "û"),
    ("Ã¼", "ü"),
    ("Ã±", "ñ"),
    ("Ã§", "ç"),
    ("ÃŸ", "ß"),
    ("Ã‰", "É"),
    ("Ã–", "Ö"),
    ("Ãœ", "Ü"),
    ("Ã„", "Ä"),
    ("Ã‡", "Ç"),
    ("Ã—", "×"),
    ("Â\u{a0}", " "),
    ("Â°", "°"),
    ("Â£", "£"),
    ("Â©", "©"),
    ("Â®", "®"),
    ("Â·", "·"),
];

/// Turn arbitrary source text into clean Unicode text.
///
/// One pass decodes HTML entities, repairs the [`MOJIBAKE`] table, applies
/// canonical decomposition (NFD), drops control characters other than tab,
/// newline and carriage return, removes runs of two or more `?`, collapses
/// whitespace and trims. Passes repeat until the output stops changing, so
/// the function is idempotent.
///
/// The loop terminates: after the first pass the text is decomposed, so no
/// mojibake pattern (all start with a precomposed letter) can match again,
/// and a later pass can only change the text by decoding an entity exposed
/// by control-character or `??` removal, which makes it strictly shorter.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  Tanker&nbsp;rates   ?? up "), "Tanker rates up");
/// assert_eq!(clean_text("Owners â€“ charterers"), "Owners \u{2013} charterers");
/// ```
pub fn clean_text(input: &str) -> String {
    let mut current = clean_pass(input);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Decode entities until none are left; `&amp;amp;` needs two rounds.
fn decode_entities(input: &str) -> String {
    let mut text = input.to_string();
    loop {
        let decoded = html_escape::decode_html_entities(&text);
        if decoded == text {
            return text;
        }
        text = decoded.into_owned();
    }
}

fn clean_pass(input: &str) -> String {
    let mut text = decode_entities(input);

    for &(broken, fixed) in MOJIBAKE {
        if text.contains(broken) {
            text = text.replace(broken, fixed);
        }
    }

    let text: String = text
        .nfd()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    let text = RE_QUESTION_RUN.replace_all(&text, "");
    text.split_whitespace().join(" ")
}

/// Reduce an HTML fragment to its text content.
///
/// Text nodes are concatenated, with a space at the boundaries of block
/// elements such as `p`, `li` or `br`; inline markup like `<b>` joins its
/// text to the surrounding words. `script` and `style` contents are dropped. Plain text passes through with
/// only entity decoding applied by the parser. The result still wants
/// [`clean_text`].
pub fn strip_html(fragment: &str) -> String {
    if !fragment.contains('<') {
        return fragment.to_string();
    }

    let document = Html::parse_fragment(fragment);
    let mut out = String::with_capacity(fragment.len());
    for node in document.tree.root().descendants() {
        if node.prev_sibling().is_some_and(|prev| is_block(prev.value())) {
            out.push(' ');
        }
        match node.value() {
            Node::Text(text) => {
                let hidden = node
                    .parent()
                    .and_then(|p| p.value().as_element().map(|e| e.name()))
                    .is_some_and(|name| name == "script" || name == "style");
                if !hidden {
                    out.push_str(text);
                }
            }
            element if is_block(element) => out.push(' '),
            _ => {}
        }
    }
    out
}

fn is_block(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| BLOCK_ELEMENTS.contains(&e.name()))
}

/// Flatten a category list into the stored `", "`-joined form.
///
/// Structured lists are taken as-is. A list holding exactly one string is
/// split on `|` when it contains one, otherwise on `,`. Pipe wins when both
/// appear. Every piece is cleaned and empty pieces are dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(flatten_categories(&["Shipping|Ports".into()]), "Shipping, Ports");
/// ```
pub fn flatten_categories(categories: &[String]) -> String {
    let pieces: Vec<&str> = match categories {
        [single] if single.contains('|') => single.split('|').collect(),
        [single] if single.contains(',') => single.split(',').collect(),
        many => many.iter().map(String::as_str).collect(),
    };

    pieces
        .into_iter()
        .map(clean_text)
        .filter(|c| !c.is_empty())
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "   ",
        "Plain headline",
        "Maersk &amp; MSC end 2M",
        "Double &amp;amp; escaped",
        "Owners â€“ charterers â€œagreeâ€\u{9d} on â€˜termsâ€™â€¦",
        "CafÃ© Ã  la carte",
        "Entity &Atilde;&copy; split",
        "Control\u{1}chars\u{7}here",
        "&amp\u{1};",
        "What??? Really ?? yes?",
        "Tabs\tand\nnewlines\r\nand   spaces",
        "Déjà vu",
        "&lt;b&gt;bold&lt;/b&gt;",
        "Â\u{a0}Price Â£5",
    ];

    #[test]
    fn test_clean_text_is_idempotent() {
        for sample in SAMPLES {
            let once = clean_text(sample);
            let twice = clean_text(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_clean_text_deeply_nested_entities() {
        let nested = format!("&{}x", "amp;".repeat(20));
        let once = clean_text(&nested);
        assert_eq!(once, "&x");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_clean_text_entity_exposed_by_cleanup() {
        assert_eq!(clean_text("&am\u{1}p;lt;"), "<");
        assert_eq!(clean_text("&a??mp; co"), "& co");
    }

    #[test]
    fn test_clean_text_decodes_entities() {
        assert_eq!(clean_text("Maersk &amp; MSC"), "Maersk & MSC");
        assert_eq!(clean_text("Double &amp;amp; escaped"), "Double & escaped");
        assert_eq!(clean_text("It&#8217;s"), "It\u{2019}s");
    }

    #[test]
    fn test_clean_text_repairs_mojibake() {
        assert_eq!(
            clean_text("Owners â€“ charterersâ€™ view"),
            "Owners \u{2013} charterers\u{2019} view"
        );
        assert_eq!(clean_text("â€œQuotedâ€\u{9d}"), "\u{201C}Quoted\u{201D}");
        assert_eq!(clean_text("Waitâ€¦"), "Wait\u{2026}");
    }

    #[test]
    fn test_clean_text_decomposes_accents() {
        assert_eq!(clean_text("CafÃ©"), "Cafe\u{301}");
        assert_eq!(clean_text("Café"), "Cafe\u{301}");
    }

    #[test]
    fn test_clean_text_strips_controls_and_whitespace() {
        assert_eq!(clean_text("Control\u{1}chars"), "Controlchars");
        assert_eq!(clean_text("  a\t\tb\n\nc  "), "a b c");
        assert_eq!(clean_text("a\u{a0}\u{a0}b"), "a b");
    }

    #[test]
    fn test_clean_text_removes_question_runs() {
        assert_eq!(clean_text("Port ?? closed"), "Port closed");
        assert_eq!(clean_text("Why???"), "Why");
        assert_eq!(clean_text("Really?"), "Really?");
    }

    #[test]
    fn test_strip_html() {
        let html = "<p>Bulk carriers <b>rally</b>.</p><p>Capesize up &amp; away</p>";
        assert_eq!(clean_text(&strip_html(html)), "Bulk carriers rally. Capesize up & away");
        assert_eq!(strip_html("no markup"), "no markup");
        let scripted = "<p>Visible</p><script>var hidden = 1;</script>";
        assert_eq!(clean_text(&strip_html(scripted)), "Visible");
    }

    #[test]
    fn test_strip_html_inline_markup_keeps_words_whole() {
        assert_eq!(clean_text(&strip_html("Ship<b>ping</b> news")), "Shipping news");
        assert_eq!(clean_text(&strip_html("<p>One</p><p>Two</p>")), "One Two");
        assert_eq!(clean_text(&strip_html("<p>Fleet</p>update")), "Fleet update");
        assert_eq!(clean_text(&strip_html("Line<br>break")), "Line break");
        assert_eq!(clean_text(&strip_html("<ul><li>a</li><li>b</li></ul>")), "a b");
    }

    #[test]
    fn test_flatten_categories_splits_single_pipe_string() {
        let cats = vec!["Shipping|Ports".to_string()];
        assert_eq!(flatten_categories(&cats), "Shipping, Ports");
    }

    #[test]
    fn test_flatten_categories_splits_single_comma_string() {
        let cats = vec!["Tankers, Bunkers ,".to_string()];
        assert_eq!(flatten_categories(&cats), "Tankers, Bunkers");
    }

    #[test]
    fn test_flatten_categories_pipe_wins_over_comma() {
        let cats = vec!["Ports, Terminals|Dry Bulk".to_string()];
        assert_eq!(flatten_categories(&cats), "Ports, Terminals, Dry Bulk");
    }

    #[test]
    fn test_flatten_categories_structured_list() {
        let cats = vec![
            " Containers ".to_string(),
            String::new(),
            "Europe|Asia".to_string(),
        ];
        assert_eq!(flatten_categories(&cats), "Containers, Europe|Asia");
        assert_eq!(flatten_categories(&[]), "");
    }
}
