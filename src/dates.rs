//! Date standardization across the formats our sources publish.
//!
//! Every stored timestamp ends up as `DD/MM/YYYY HH:MM:SS` in one target
//! timezone. RSS feeds mostly send RFC 2822, listing pages send whatever
//! their CMS template prints, and one source appends a timezone
//! abbreviation that generic parsers reject.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use tracing::debug;

/// Output format for `pubdate` and `scrape_timestamp`.
pub const OUTPUT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Source label whose dates carry a trailing timezone abbreviation.
pub const TZ_ABBREVIATION_SOURCE: &str = "Seatrade Maritime";

static RE_TRAILING_TZ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+(GMT|UTC|BST|CET|CEST|EST|EDT|PST|PDT)$").unwrap()
});

/// Abbreviations that mean UTC whoever writes them.
static RE_TRAILING_UTC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+(GMT|UTC)$").unwrap());

/// Formats that carry their own offset (`%z`).
const OFFSET_FORMATS: &[&str] = &[
    "%d %B %Y %H:%M %z",
    "%d %B %Y %H:%M:%S %z",
    "%d %B %Y, %H:%M %z",
    "%a, %d %b %Y %H:%M %z",
    "%B %d, %Y %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Date-time formats without an offset; taken as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d %B %Y %H:%M",
    "%d %B %Y %H:%M:%S",
    "%d %B %Y, %H:%M",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%a, %d %b %Y %H:%M:%S",
];

/// Date-only formats; taken as midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %B %Y", "%B %d, %Y", "%b %d, %Y", "%d.%m.%Y"];

/// Map a free-form date string to `DD/MM/YYYY HH:MM:SS` in `tz`.
///
/// `source` lets source-specific rewrites run before generic parsing; for
/// every other source only a trailing `GMT` or `UTC` is understood. Values
/// without a timezone are read as UTC. Empty input gives an empty string;
/// anything unparsable comes back trimmed but otherwise unchanged.
///
/// # Examples
///
/// ```ignore
/// let tz: Tz = "Asia/Singapore".parse().unwrap();
/// assert_eq!(
///     standardize_date("22 August 2025 14:31 GMT", Some("Seatrade Maritime"), tz),
///     "22/08/2025 22:31:00"
/// );
/// ```
pub fn standardize_date(raw: &str, source: Option<&str>, tz: Tz) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let prepared = preprocess(trimmed, source);
    match parse_any(&prepared) {
        Some(instant) => format_timestamp(instant, tz),
        None => {
            debug!(raw = %trimmed, ?source, "Unparsable date; keeping original");
            trimmed.to_string()
        }
    }
}

/// Format an instant the way every stored timestamp is formatted.
pub fn format_timestamp(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format(OUTPUT_FORMAT).to_string()
}

fn preprocess<'a>(raw: &'a str, source: Option<&str>) -> Cow<'a, str> {
    match source {
        Some(TZ_ABBREVIATION_SOURCE) => {
            RE_TRAILING_TZ.replace(raw, |caps: &regex::Captures| {
                format!(" {}", abbreviation_offset(&caps[1]))
            })
        }
        _ => RE_TRAILING_UTC.replace(raw, " +0000"),
    }
}

fn abbreviation_offset(abbr: &str) -> &'static str {
    match abbr {
        "BST" | "CET" => "+0100",
        "CEST" => "+0200",
        "EST" => "-0500",
        "EDT" => "-0400",
        "PST" => "-0800",
        "PDT" => "-0700",
        _ => "+0000",
    }
}

fn parse_any(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}
