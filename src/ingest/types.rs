// src/ingest/types.rs
use std::collections::BTreeMap;

use chrono::NaiveDate;
use url::Url;

/// One configured origin to scrape. Supplied by static configuration at
/// process start; immutable during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub uri: Url,
    pub kind: SourceKind,
    pub label: String,
    /// Sanctioning body stamped onto every record from this source
    /// (schedule pages only; news feeds leave it unset).
    pub federation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// RSS or Atom feed.
    Feed,
    /// HTML page with a repeating block of items (e.g. a contest schedule).
    Listing,
    /// HTML page describing a single item.
    Detail,
}

/// Unprocessed extraction result, one per discovered item within a
/// source. Field values may still contain markup and relative links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub source_label: String,
    pub title_text: String,
    pub link_text: String,
    pub date_text: String,
    pub location_text: Option<String>,
    pub summary_text: Option<String>,
}

/// Canonical output unit. `title` and `url` are both non-empty for any
/// record that reaches the deduplicator; candidates failing that are
/// dropped during normalization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceError {
    pub source: String,
    pub message: String,
}

/// Result of one full ingestion run, returned to the trigger caller.
/// Never persisted here; the document store owns durable state.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    pub ok: bool,
    pub sources_configured: usize,
    pub sources_resolved: usize,
    pub sources_succeeded: usize,
    pub records_extracted: usize,
    pub records_dropped: usize,
    pub duplicates_dropped: usize,
    pub records_indexed: usize,
    pub per_source_counts: BTreeMap<String, usize>,
    pub errors: Vec<SourceError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_uid: Option<u64>,
}
