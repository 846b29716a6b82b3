// src/ingest/scheduler.rs
use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;

use crate::config::IngestConfig;
use crate::ingest;
use crate::ingest::fetch::ContentFetcher;
use crate::store::DocumentStore;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn a lightweight scheduler that reruns the pipeline on a fixed
/// interval. The /ingest trigger keeps working independently of it.
pub fn spawn_interval_scheduler(
    cfg: IngestSchedulerCfg,
    config: Arc<IngestConfig>,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn DocumentStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(cfg.interval_secs));
        loop {
            ticker.tick().await;
            counter!("ingest_runs_total").increment(1);

            match ingest::run_once(&config, fetcher.as_ref(), store.as_ref()).await {
                Ok(summary) => tracing::info!(
                    target: "ingest",
                    indexed = summary.records_indexed,
                    extracted = summary.records_extracted,
                    duplicates = summary.duplicates_dropped,
                    errors = summary.errors.len(),
                    "scheduled ingest tick"
                ),
                Err(e) => tracing::error!(
                    target: "ingest",
                    error = ?e,
                    "scheduled ingest failed"
                ),
            }
        }
    })
}
