//! Ingestion Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and the
//! optional interval scheduler.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bodybuilding_news_ingest::api::{self, AppState};
use bodybuilding_news_ingest::ingest::scheduler::{spawn_interval_scheduler, IngestSchedulerCfg};
use bodybuilding_news_ingest::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - INGEST_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("INGEST_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ingest=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments. This is what
    // feeds MEILI_HOST / MEILI_API_KEY / INGEST_SECRET locally.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let state = AppState::from_env();

    // Opt-in interval reruns; the /ingest trigger works either way.
    let interval_secs = std::env::var("INGEST_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0);

    let metrics = Metrics::init(interval_secs.unwrap_or(0));

    if let (Some(interval_secs), Some(store)) = (interval_secs, state.store.clone()) {
        spawn_interval_scheduler(
            IngestSchedulerCfg { interval_secs },
            state.config.clone(),
            state.fetcher.clone(),
            store,
        );
    }

    let router = api::router(state).merge(metrics.router());
    Ok(router.into())
}
