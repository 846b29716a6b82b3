// src/ingest/extract/html.rs
//
// HTML extraction over ordered selector fallbacks. Schedule and event
// pages differ per site and per theme deploy, so every field carries a
// small list of attempts tried in order; the first non-empty match wins.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::ingest::types::{RawRecord, Source};

/// One attempt at pulling a field out of an element: a CSS selector
/// plus, optionally, the attribute to read instead of the text content.
struct FieldRule {
    selector: Selector,
    attr: Option<&'static str>,
}

impl FieldRule {
    fn text(selector: &str) -> Self {
        Self {
            selector: Selector::parse(selector).unwrap(),
            attr: None,
        }
    }

    fn attr(selector: &str, attr: &'static str) -> Self {
        Self {
            selector: Selector::parse(selector).unwrap(),
            attr: Some(attr),
        }
    }
}

fn first_match(scope: ElementRef<'_>, rules: &[FieldRule]) -> Option<String> {
    for rule in rules {
        for el in scope.select(&rule.selector) {
            let value = match rule.attr {
                Some(name) => el.value().attr(name).unwrap_or_default().to_string(),
                None => el.text().collect::<Vec<_>>().join(" "),
            };
            let value = value.trim().to_string();
            if !value.is_empty() {
                return Some(value);
            }
        }
    }
    None
}

struct ListingPlan {
    containers: Vec<Selector>,
    title: Vec<FieldRule>,
    link: Vec<FieldRule>,
    date: Vec<FieldRule>,
    location: Vec<FieldRule>,
    summary: Vec<FieldRule>,
}

// Container and field variants seen across the federation schedule
// themes (tribe-events calendars, Avada portfolio cards, plain article
// lists).
static LISTING_PLAN: Lazy<ListingPlan> = Lazy::new(|| ListingPlan {
    containers: [
        "article",
        ".tribe-events-calendar-list__event",
        ".fusion-portfolio-content",
        ".ecs-event",
        "li.event",
        ".event-item",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect(),
    title: vec![
        FieldRule::text("h2 a"),
        FieldRule::text("h3 a"),
        FieldRule::text(".event-title"),
        FieldRule::text("h2"),
        FieldRule::text("h3"),
    ],
    link: vec![
        FieldRule::attr("h2 a[href]", "href"),
        FieldRule::attr("h3 a[href]", "href"),
        FieldRule::attr(".event-title a[href]", "href"),
        FieldRule::attr("a[href]", "href"),
    ],
    date: vec![
        FieldRule::text(".event-date"),
        FieldRule::attr("time[datetime]", "datetime"),
        FieldRule::text("time"),
        FieldRule::text(".tribe-event-date-start"),
    ],
    location: vec![
        FieldRule::text(".event-city"),
        FieldRule::text(".event-location"),
        FieldRule::text(".tribe-events-venue-details"),
        FieldRule::text(".venue"),
        FieldRule::text(".location"),
    ],
    summary: vec![
        FieldRule::text(".event-description"),
        FieldRule::text(".tribe-events-list-event-description"),
        FieldRule::text(".excerpt"),
    ],
});

struct DetailPlan {
    title: Vec<FieldRule>,
    date: Vec<FieldRule>,
    location: Vec<FieldRule>,
    summary: Vec<FieldRule>,
}

static DETAIL_PLAN: Lazy<DetailPlan> = Lazy::new(|| DetailPlan {
    title: vec![
        FieldRule::attr(r#"meta[property="og:title"]"#, "content"),
        FieldRule::text("h1.entry-title"),
        FieldRule::text("h1"),
        FieldRule::text("title"),
    ],
    date: vec![
        FieldRule::attr("time[datetime]", "datetime"),
        FieldRule::attr(r#"meta[property="article:published_time"]"#, "content"),
        FieldRule::text(".event-date"),
        FieldRule::text("time"),
    ],
    location: vec![
        FieldRule::text(".event-city"),
        FieldRule::text(".event-location"),
        FieldRule::text(".venue"),
        FieldRule::text(".location"),
    ],
    summary: vec![
        FieldRule::attr(r#"meta[name="description"]"#, "content"),
        FieldRule::attr(r#"meta[property="og:description"]"#, "content"),
    ],
});

/// Scan a listing page for repeating item blocks. Container variants are
/// themselves an ordered fallback: the first selector that matches
/// anything claims the page. No matching container yields zero records,
/// which the summary surfaces as the "structure changed" signal.
pub fn extract_listing(html: &str, source_label: &str) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    let plan = &*LISTING_PLAN;
    let mut out = Vec::new();

    for container in &plan.containers {
        let blocks: Vec<ElementRef<'_>> = doc.select(container).collect();
        if blocks.is_empty() {
            continue;
        }
        for block in blocks {
            let Some(title) = first_match(block, &plan.title) else {
                continue;
            };
            let link = first_match(block, &plan.link).unwrap_or_default();
            // Without a dedicated date element the whole block text goes
            // through; the date scanner picks the first calendar date out
            // of the prose.
            let date = first_match(block, &plan.date)
                .unwrap_or_else(|| block.text().collect::<Vec<_>>().join(" "));
            out.push(RawRecord {
                source_label: source_label.to_string(),
                title_text: title,
                link_text: link,
                date_text: date,
                location_text: first_match(block, &plan.location),
                summary_text: first_match(block, &plan.summary),
            });
        }
        break;
    }
    out
}

/// A detail page describes a single item; its own URI is the link.
pub fn extract_detail(html: &str, source: &Source) -> Vec<RawRecord> {
    let doc = Html::parse_document(html);
    let plan = &*DETAIL_PLAN;
    let root = doc.root_element();

    let Some(title) = first_match(root, &plan.title) else {
        return Vec::new();
    };
    vec![RawRecord {
        source_label: source.label.clone(),
        title_text: title,
        link_text: source.uri.to_string(),
        date_text: first_match(root, &plan.date).unwrap_or_default(),
        location_text: first_match(root, &plan.location),
        summary_text: first_match(root, &plan.summary),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_respects_rule_order() {
        let html = Html::parse_fragment(
            r#"<div><a href="/x">anchor</a><h3><a href="/y">Heading</a></h3></div>"#,
        );
        let rules = [FieldRule::text("h3 a"), FieldRule::text("a")];
        assert_eq!(
            first_match(html.root_element(), &rules).as_deref(),
            Some("Heading")
        );
    }

    #[test]
    fn first_match_skips_empty_values() {
        let html = Html::parse_fragment(r#"<div><span class="event-date">  </span><time>Nov 21, 2025</time></div>"#);
        let rules = [FieldRule::text(".event-date"), FieldRule::text("time")];
        assert_eq!(
            first_match(html.root_element(), &rules).as_deref(),
            Some("Nov 21, 2025")
        );
    }
}
