// tests/ingest_normalize.rs
use bodybuilding_news_ingest::ingest::normalize::{clean_text, normalize};
use bodybuilding_news_ingest::{RawRecord, Source, SourceKind};
use url::Url;

fn listing_source() -> Source {
    Source {
        uri: Url::parse("https://npcnewsonline.com/schedule/").unwrap(),
        kind: SourceKind::Listing,
        label: "npc-schedule".to_string(),
        federation: Some("NPC".to_string()),
    }
}

fn raw(title: &str, link: &str) -> RawRecord {
    RawRecord {
        source_label: "npc-schedule".to_string(),
        title_text: title.to_string(),
        link_text: link.to_string(),
        ..RawRecord::default()
    }
}

#[test]
fn empty_is_ok() {
    assert_eq!(clean_text(""), "");
}

#[test]
fn strips_html_and_unescapes() {
    let s = "<p>Hello&nbsp;<b>world</b> &ldquo;ok&rdquo;</p>";
    assert_eq!(clean_text(s), r#"Hello world "ok""#);
}

#[test]
fn folds_whitespace_and_nbsp() {
    assert_eq!(clean_text("A\u{00A0}\n\tB   C"), "A B C");
}

#[test]
fn record_fields_are_cleaned_and_resolved() {
    let rec = normalize(
        RawRecord {
            source_label: "npc-schedule".to_string(),
            title_text: "<b>NPC  Midwest\nClassic</b>".to_string(),
            link_text: "/contest/2025-npc-midwest-classic/".to_string(),
            date_text: "November 21 - 22, 2025".to_string(),
            location_text: Some("  Chicago,&nbsp;IL ".to_string()),
            summary_text: Some("<p>National qualifier.</p>".to_string()),
        },
        &listing_source(),
    )
    .unwrap();

    assert_eq!(rec.title, "NPC Midwest Classic");
    assert_eq!(
        rec.url,
        "https://npcnewsonline.com/contest/2025-npc-midwest-classic/"
    );
    assert_eq!(rec.date.unwrap().to_string(), "2025-11-21");
    assert_eq!(rec.location.as_deref(), Some("Chicago, IL"));
    assert_eq!(rec.summary.as_deref(), Some("National qualifier."));
    assert_eq!(rec.federation.as_deref(), Some("NPC"));
    assert_eq!(rec.source, "npc-schedule");
}

#[test]
fn missing_link_drops_the_record() {
    assert!(normalize(raw("Has a title", ""), &listing_source()).is_none());
    assert!(normalize(raw("Has a title", "   "), &listing_source()).is_none());
}

#[test]
fn markup_only_title_drops_the_record() {
    assert!(normalize(raw("<b> </b>", "https://example.com/a"), &listing_source()).is_none());
    assert!(normalize(raw("", "https://example.com/a"), &listing_source()).is_none());
}

#[test]
fn unparseable_date_stays_absent() {
    let mut r = raw("Show", "https://example.com/a");
    r.date_text = "TBD".to_string();
    let rec = normalize(r, &listing_source()).unwrap();
    assert!(rec.date.is_none());
}

#[test]
fn same_url_yields_same_id_across_sources() {
    let a = normalize(raw("Show A", "https://example.com/a"), &listing_source()).unwrap();
    let other = Source {
        uri: Url::parse("https://feeds.example.com/news.xml").unwrap(),
        kind: SourceKind::Feed,
        label: "news".to_string(),
        federation: None,
    };
    let b = normalize(raw("Show A (again)", "https://example.com/a"), &other).unwrap();
    assert_eq!(a.id, b.id);
}

#[test]
fn overlong_summaries_are_capped() {
    let mut r = raw("Show", "https://example.com/a");
    r.summary_text = Some("x".repeat(2_000));
    let rec = normalize(r, &listing_source()).unwrap();
    assert!(rec.summary.unwrap().chars().count() <= 1_500);
}
