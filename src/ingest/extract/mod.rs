// src/ingest/extract/mod.rs
pub mod feed;
pub mod html;

use crate::ingest::fetch::{ContentKind, FetchedContent};
use crate::ingest::types::{RawRecord, Source, SourceKind};

/// Safety cap on candidates taken from one source in one run. Not an
/// error condition; it bounds processing cost when a feed dumps its
/// whole archive.
pub const MAX_RECORDS_PER_SOURCE: usize = 40;

/// Turn fetched content into raw candidate records. Dispatch follows the
/// detected content kind, not the configured one: a feed URL answering
/// with HTML is almost always an error page, and yields zero records
/// rather than a bogus parse.
pub fn extract(content: &FetchedContent, source: &Source) -> Vec<RawRecord> {
    let mut records = match (content.kind, source.kind) {
        (ContentKind::Xml, _) => feed::extract(&content.body, &source.label),
        (ContentKind::Html, SourceKind::Listing) => {
            html::extract_listing(&content.body, &source.label)
        }
        (ContentKind::Html, SourceKind::Detail) => html::extract_detail(&content.body, source),
        (ContentKind::Html, SourceKind::Feed) => {
            tracing::warn!(source = %source.label, "expected feed content, got html");
            Vec::new()
        }
    };
    records.truncate(MAX_RECORDS_PER_SOURCE);
    records
}
