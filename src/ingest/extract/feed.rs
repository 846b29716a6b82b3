// src/ingest/extract/feed.rs
//
// RSS/Atom item extraction. Structures map only the fields we read;
// everything else in the channel is ignored by serde.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::RawRecord;

/// Title sentinel for the (theoretical) candidate whose link survives
/// but whose title and link text are both blank. Never an empty string.
pub const UNTITLED: &str = "(untitled)";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<Text>,
    link: Option<Text>,
    #[serde(rename = "pubDate")]
    pub_date: Option<Text>,
    description: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<Text>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    id: Option<Text>,
    summary: Option<Text>,
    content: Option<Text>,
    updated: Option<Text>,
    published: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Element whose text (or CDATA) body is all we care about; attributes,
/// if present, are ignored.
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text")]
    value: Option<String>,
}

fn text(t: &Option<Text>) -> String {
    t.as_ref()
        .and_then(|t| t.value.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Scan feed XML for RSS `<item>` blocks, then Atom `<entry>` blocks.
/// Content that parses as neither yields zero records, not an error.
pub fn extract(xml: &str, source_label: &str) -> Vec<RawRecord> {
    let cleaned = scrub_xml(xml);

    if let Ok(rss) = from_str::<Rss>(&cleaned) {
        if !rss.channel.item.is_empty() {
            return rss
                .channel
                .item
                .into_iter()
                .filter_map(|it| item_record(it, source_label))
                .collect();
        }
    }
    if let Ok(feed) = from_str::<AtomFeed>(&cleaned) {
        return feed
            .entry
            .into_iter()
            .filter_map(|e| entry_record(e, source_label))
            .collect();
    }
    Vec::new()
}

fn item_record(it: Item, source_label: &str) -> Option<RawRecord> {
    let link = text(&it.link);
    if link.is_empty() {
        // A record with no addressable target is not useful.
        return None;
    }
    let mut title = text(&it.title);
    if title.is_empty() {
        title = link.clone();
    }
    if title.is_empty() {
        title = UNTITLED.to_string();
    }
    Some(RawRecord {
        source_label: source_label.to_string(),
        title_text: title,
        link_text: link,
        date_text: text(&it.pub_date),
        location_text: None,
        summary_text: non_empty(text(&it.description)),
    })
}

fn entry_record(e: Entry, source_label: &str) -> Option<RawRecord> {
    // Prefer the alternate link (no rel means alternate, per Atom), then
    // any href, then the entry id, which is a resolvable URL on most
    // feeds in the wild.
    let link = e
        .link
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .and_then(|l| l.href.clone())
        .or_else(|| e.link.iter().find_map(|l| l.href.clone()))
        .unwrap_or_else(|| text(&e.id))
        .trim()
        .to_string();
    if link.is_empty() {
        return None;
    }

    let mut title = text(&e.title);
    if title.is_empty() {
        title = link.clone();
    }
    if title.is_empty() {
        title = UNTITLED.to_string();
    }

    let mut date = text(&e.updated);
    if date.is_empty() {
        date = text(&e.published);
    }
    let mut summary = text(&e.summary);
    if summary.is_empty() {
        summary = text(&e.content);
    }

    Some(RawRecord {
        source_label: source_label.to_string(),
        title_text: title,
        link_text: link,
        date_text: date,
        location_text: None,
        summary_text: non_empty(summary),
    })
}

/// Feeds in the wild ship a BOM, leading junk before the prolog, and
/// HTML entities the XML parser has no definitions for.
fn scrub_xml(xml: &str) -> String {
    let mut s = xml.trim_start_matches('\u{feff}').trim().to_string();
    if let Some(start) = s
        .find("<?xml")
        .or_else(|| s.find("<rss"))
        .or_else(|| s.find("<feed"))
    {
        s = s[start..].to_string();
    }
    s.replace("&nbsp;", "&#160;")
        .replace("&ndash;", "&#8211;")
        .replace("&mdash;", "&#8212;")
        .replace("&rsquo;", "&#8217;")
        .replace("&lsquo;", "&#8216;")
        .replace("&rdquo;", "&#8221;")
        .replace("&ldquo;", "&#8220;")
        .replace("&apos;", "&#39;")
}
