// src/ingest/mod.rs
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod scheduler;
pub mod types;

use std::collections::{BTreeMap, HashSet};

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::config::{IngestConfig, SourceSpec};
use crate::store::DocumentStore;
use fetch::ContentFetcher;
use types::{IngestionSummary, NormalizedRecord, Source, SourceError, SourceKind};

/// How many sources are fetched concurrently. Wide enough to hide
/// network latency, narrow enough not to trip the host's outbound
/// connection limits.
pub const FETCH_BATCH_WIDTH: usize = 5;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_records_extracted_total",
            "Raw candidates extracted from sources."
        );
        describe_counter!(
            "ingest_records_indexed_total",
            "Records submitted to the document store."
        );
        describe_counter!(
            "ingest_records_dropped_total",
            "Candidates dropped for missing title/url."
        );
        describe_counter!(
            "ingest_duplicates_total",
            "Records collapsed by identity-key deduplication."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch/resolve failures."
        );
        describe_counter!("ingest_runs_total", "Completed scheduler ticks.");
        describe_histogram!(
            "ingest_source_ms",
            "Per-source fetch+extract+normalize time in milliseconds."
        );
        describe_gauge!("ingest_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

struct SourceOutcome {
    label: String,
    extracted: usize,
    records: Vec<NormalizedRecord>,
    error: Option<String>,
}

/// Fetch, extract, and normalize one source. Failures are captured in
/// the outcome; one source's failure must never abort its siblings.
async fn ingest_source(fetcher: &dyn ContentFetcher, source: &Source) -> SourceOutcome {
    let t0 = std::time::Instant::now();
    let outcome = match fetcher.fetch(&source.uri).await {
        Ok(content) => {
            let raw = extract::extract(&content, source);
            let extracted = raw.len();
            if extracted == 0 {
                tracing::warn!(
                    source = %source.label,
                    "zero records extracted; page structure may have changed"
                );
            }
            let records = raw
                .into_iter()
                .filter_map(|r| normalize::normalize(r, source))
                .collect();
            SourceOutcome {
                label: source.label.clone(),
                extracted,
                records,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = ?e, source = %source.label, "source fetch failed");
            counter!("ingest_source_errors_total").increment(1);
            SourceOutcome {
                label: source.label.clone(),
                extracted: 0,
                records: Vec::new(),
                error: Some(format!("{e:#}")),
            }
        }
    };
    histogram!("ingest_source_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    outcome
}

/// Expand symbolic source specs into fetchable sources. Only YouTube
/// handles need the network; anything unresolvable is reported and
/// skipped.
async fn resolve_sources(
    fetcher: &dyn ContentFetcher,
    specs: &[SourceSpec],
) -> (Vec<Source>, Vec<SourceError>) {
    let mut sources = Vec::with_capacity(specs.len());
    let mut errors = Vec::new();
    for spec in specs {
        match spec {
            SourceSpec::Resolved(s) => sources.push(s.clone()),
            SourceSpec::YoutubeHandle { handle, federation } => {
                match fetch::resolve_youtube_handle(fetcher, handle).await {
                    Ok(uri) => sources.push(Source {
                        label: format!("youtube:@{handle}"),
                        uri,
                        kind: SourceKind::Feed,
                        federation: federation.clone(),
                    }),
                    Err(e) => {
                        counter!("ingest_source_errors_total").increment(1);
                        errors.push(SourceError {
                            source: format!("youtube:@{handle}"),
                            message: format!("{e:#}"),
                        });
                    }
                }
            }
        }
    }
    (sources, errors)
}

/// Collapse records sharing an identity key, keeping the earliest.
/// Input order is source-list order then document order, so "first
/// occurrence wins" is deterministic and documented.
pub fn dedupe(records: Vec<NormalizedRecord>) -> (Vec<NormalizedRecord>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for rec in records {
        if seen.insert(rec.id.clone()) {
            kept.push(rec);
        } else {
            dropped += 1;
        }
    }
    (kept, dropped)
}

/// Run the pipeline once: resolve sources, fetch each with bounded
/// parallelism, normalize and merge in source order, dedupe, and submit
/// one batch to the store. Per-source failures land in the summary; only
/// a store-level failure is fatal for the run.
pub async fn run_once(
    cfg: &IngestConfig,
    fetcher: &dyn ContentFetcher,
    store: &dyn DocumentStore,
) -> anyhow::Result<IngestionSummary> {
    ensure_metrics_described();

    let (sources, mut errors) = resolve_sources(fetcher, &cfg.sources).await;

    // `buffered` (not `buffer_unordered`) keeps source-list order in the
    // merged output, which the dedup rule depends on.
    let source_futures: Vec<_> = sources
        .iter()
        .map(|src| ingest_source(fetcher, src))
        .collect();
    let outcomes: Vec<SourceOutcome> = stream::iter(source_futures)
        .buffered(FETCH_BATCH_WIDTH)
        .collect()
        .await;

    let mut per_source_counts = BTreeMap::new();
    let mut merged: Vec<NormalizedRecord> = Vec::new();
    let mut sources_succeeded = 0usize;
    let mut records_extracted = 0usize;
    for outcome in outcomes {
        match outcome.error {
            Some(message) => errors.push(SourceError {
                source: outcome.label,
                message,
            }),
            None => {
                sources_succeeded += 1;
                records_extracted += outcome.extracted;
                *per_source_counts.entry(outcome.label).or_insert(0) += outcome.extracted;
                merged.extend(outcome.records);
            }
        }
    }

    let records_dropped = records_extracted - merged.len();
    let (unique, duplicates_dropped) = dedupe(merged);

    let task_uid = if unique.is_empty() {
        None
    } else {
        store
            .upsert_documents(&cfg.index_uid, &unique)
            .await?
            .task_uid
    };

    counter!("ingest_records_extracted_total").increment(records_extracted as u64);
    counter!("ingest_records_dropped_total").increment(records_dropped as u64);
    counter!("ingest_duplicates_total").increment(duplicates_dropped as u64);
    counter!("ingest_records_indexed_total").increment(unique.len() as u64);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    Ok(IngestionSummary {
        ok: true,
        sources_configured: cfg.sources.len(),
        sources_resolved: sources.len(),
        sources_succeeded,
        records_extracted,
        records_dropped,
        duplicates_dropped,
        records_indexed: unique.len(),
        per_source_counts,
        errors,
        task_uid,
    })
}
