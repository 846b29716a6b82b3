// src/ingest/normalize.rs
//
// Field cleaning and canonicalization. Everything here is pure; the
// pipeline calls `normalize` once per raw record after extraction.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::OnceCell;
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

use crate::ingest::types::{NormalizedRecord, RawRecord, Source};

/// Summaries longer than this are cut; titles never get near it.
const SUMMARY_CAP: usize = 1_500;

/// Normalize text: decode entities, strip tags, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Resolve a possibly-relative link against the source origin. Only
/// http(s) targets are addressable; anything else is rejected.
pub fn resolve_link(link: &str, base: &Url) -> Option<Url> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Url::parse(trimmed) {
        Ok(u) => matches!(u.scheme(), "http" | "https").then_some(u),
        Err(_) => base.join(trimmed).ok(),
    }
}

const HUMAN_FORMATS: [&str; 6] = [
    "%B %d, %Y", // November 21, 2025
    "%b %d, %Y", // Nov 21, 2025
    "%d %B %Y",  // 21 November 2025
    "%d %b %Y",  // 21 Nov 2025
    "%m/%d/%Y",  // 03/04/2025
    "%m/%d/%y",  // 03/04/25
];

/// Best-effort conversion of free-form date text to a calendar date.
///
/// Attempts, in order: strict `YYYY-MM-DD`, RFC 3339, RFC 2822, the fixed
/// list of human formats above (ordinal suffixes stripped), then a
/// month-name scan that tolerates surrounding prose and day ranges
/// ("November 21 - 22, 2025" parses as the 21st). Returns `None` when
/// nothing matches; an unparseable date is never guessed as "today".
pub fn normalize_date(text: &str) -> Option<NaiveDate> {
    let t = clean_text(text);
    if t.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(&t, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&t) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&t) {
        return Some(dt.date_naive());
    }

    let stripped = strip_ordinals(&t);
    for fmt in HUMAN_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&stripped, fmt) {
            return Some(d);
        }
    }

    scan_month_day_year(&stripped).or_else(|| scan_day_month_year(&stripped))
}

fn strip_ordinals(s: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());
    re.replace_all(s, "$1").to_string()
}

/// "Month D[ - D][,] YYYY" anywhere in the text; ranges keep the first day.
fn scan_month_day_year(s: &str) -> Option<NaiveDate> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\.?\s+(\d{1,2})(?:\s*[-\u{2013}\u{2014}]\s*\d{1,2})?\s*,?\s+(\d{4})\b",
        )
        .unwrap()
    });
    let c = re.captures(s)?;
    let month = month_number(&c[1])?;
    let day: u32 = c[2].parse().ok()?;
    let year: i32 = c[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// "D Month YYYY" anywhere in the text. Also rescues RFC 2822 stamps
/// whose weekday lies about the date ("Wed, 21 Nov 2025 ..."), which the
/// strict parser rejects.
fn scan_day_month_year(s: &str) -> Option<NaiveDate> {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})\s+(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\.?\s+(\d{4})\b")
            .unwrap()
    });
    let c = re.captures(s)?;
    let day: u32 = c[1].parse().ok()?;
    let month = month_number(&c[2])?;
    let year: i32 = c[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let n = name.to_ascii_lowercase();
    if n.len() < 3 {
        return None;
    }
    Some(match &n[..3] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    })
}

/// Stable identity key: hex SHA-256 of the normalized URL, falling back
/// to the title bytes when the URL is somehow absent.
pub fn record_id(url: &str, title: &str) -> String {
    let key = if url.is_empty() { title } else { url };
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Turn a raw extraction result into the canonical record, or `None`
/// when the cleaned title or resolved URL comes up empty.
pub fn normalize(raw: RawRecord, source: &Source) -> Option<NormalizedRecord> {
    let title = clean_text(&raw.title_text);
    if title.is_empty() {
        return None;
    }
    let url = resolve_link(&raw.link_text, &source.uri)?.to_string();

    let date = normalize_date(&raw.date_text);
    let location = raw.location_text.as_deref().map(clean_text).filter(|s| !s.is_empty());
    let summary = raw
        .summary_text
        .as_deref()
        .map(clean_text)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.chars().count() > SUMMARY_CAP {
                s.chars().take(SUMMARY_CAP).collect()
            } else {
                s
            }
        });

    Some(NormalizedRecord {
        id: record_id(&url, &title),
        title,
        url,
        source: raw.source_label,
        date,
        location,
        summary,
        federation: source.federation.clone(),
    })
}
