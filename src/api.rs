use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::config::{self, IngestConfig};
use crate::ingest;
use crate::ingest::fetch::{ContentFetcher, HttpFetcher};
use crate::store::{DocumentStore, MeiliStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IngestConfig>,
    pub fetcher: Arc<dyn ContentFetcher>,
    /// Absent when the store env vars are missing; /ingest reports that
    /// per request instead of refusing to boot.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub ingest_secret: Option<String>,
}

impl AppState {
    pub fn from_env() -> Self {
        let config = match IngestConfig::load() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = ?e, "source config load failed; starting with none");
                IngestConfig::default()
            }
        };

        let fetcher: Arc<dyn ContentFetcher> = Arc::new(
            HttpFetcher::new(config.fetch_timeout_secs).expect("building http client"),
        );

        let store = match config::StoreConfig::from_env().and_then(MeiliStore::new) {
            Ok(s) => Some(Arc::new(s) as Arc<dyn DocumentStore>),
            Err(e) => {
                tracing::warn!(error = ?e, "document store not configured");
                None
            }
        };

        Self {
            config: Arc::new(config),
            fetcher,
            store,
            ingest_secret: config::ingest_secret_from_env(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/ingest", get(run_ingest))
        .route("/debug/sources", get(debug_sources))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct IngestParams {
    #[serde(default)]
    token: Option<String>,
}

/// Trigger one ingestion run. Protect with ?token=INGEST_SECRET.
async fn run_ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
) -> impl IntoResponse {
    match (&state.ingest_secret, params.token.as_deref()) {
        (Some(secret), Some(token)) if token == secret.as_str() => {}
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "unauthorized" })),
            )
                .into_response();
        }
    }

    let Some(store) = state.store.clone() else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "MEILI_HOST or MEILI_API_KEY missing in env"
            })),
        )
            .into_response();
    };

    match ingest::run_once(&state.config, state.fetcher.as_ref(), store.as_ref()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "ingest run failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "ok": false, "error": format!("{e:#}") })),
            )
                .into_response()
        }
    }
}

async fn debug_sources(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.config.sources.iter().map(|s| s.label()).collect())
}
