// tests/extract_feed.rs
use bodybuilding_news_ingest::ingest::extract::{self, feed, MAX_RECORDS_PER_SOURCE};
use bodybuilding_news_ingest::ingest::fetch::{ContentKind, FetchedContent};
use bodybuilding_news_ingest::{Source, SourceKind};
use url::Url;

fn feed_source() -> Source {
    Source {
        uri: Url::parse("https://generationiron.com/feed/").unwrap(),
        kind: SourceKind::Feed,
        label: "generationiron.com".to_string(),
        federation: None,
    }
}

#[test]
fn rss_items_are_extracted_with_their_fields() {
    let xml = include_str!("fixtures/generationiron_rss.xml");
    let records = feed::extract(xml, "generationiron.com");

    // Three items in the fixture; the link-less one is discarded.
    assert_eq!(records.len(), 2);

    assert_eq!(
        records[0].title_text,
        "Derek Lunsford\u{2019}s Offseason Plan"
    );
    assert_eq!(
        records[0].link_text,
        "https://generationiron.com/derek-lunsford-offseason/"
    );
    assert_eq!(records[0].date_text, "Fri, 21 Nov 2025 10:00:00 GMT");
    assert!(records[0]
        .summary_text
        .as_deref()
        .unwrap()
        .contains("offseason"));
}

#[test]
fn rss_title_falls_back_to_link_text() {
    let xml = include_str!("fixtures/generationiron_rss.xml");
    let records = feed::extract(xml, "generationiron.com");
    let untitled = &records[1];
    assert_eq!(untitled.link_text, "https://generationiron.com/untitled-post/");
    assert_eq!(untitled.title_text, untitled.link_text);
}

#[test]
fn atom_entries_read_the_link_href() {
    let xml = include_str!("fixtures/youtube_atom.xml");
    let records = feed::extract(xml, "youtube:nick-strength-and-power");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title_text, "2025 Olympia Recap");
    assert_eq!(
        records[0].link_text,
        "https://www.youtube.com/watch?v=abc123"
    );
    assert_eq!(records[0].date_text, "2025-10-13T02:11:08+00:00");

    // No title on the second entry: falls back to the link.
    assert_eq!(
        records[1].title_text,
        "https://www.youtube.com/watch?v=def456"
    );
}

#[test]
fn extraction_caps_candidates_per_source() {
    let mut xml =
        String::from("<?xml version=\"1.0\"?><rss version=\"2.0\"><channel>");
    for i in 0..60 {
        xml.push_str(&format!(
            "<item><title>Post {i}</title><link>https://example.com/{i}</link></item>"
        ));
    }
    xml.push_str("</channel></rss>");

    let content = FetchedContent {
        body: xml,
        kind: ContentKind::Xml,
    };
    let records = extract::extract(&content, &feed_source());
    assert_eq!(records.len(), MAX_RECORDS_PER_SOURCE);
    assert_eq!(records[0].title_text, "Post 0");
}

#[test]
fn html_answer_on_a_feed_source_yields_zero_records() {
    let content = FetchedContent {
        body: "<html><body><h1>404 Not Found</h1></body></html>".to_string(),
        kind: ContentKind::Html,
    };
    assert!(extract::extract(&content, &feed_source()).is_empty());
}
