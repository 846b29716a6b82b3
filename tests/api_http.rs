// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /ingest (token guard, missing store, happy path)
// - GET /debug/sources

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`
use url::Url;

use bodybuilding_news_ingest::api::{router, AppState};
use bodybuilding_news_ingest::config::{IngestConfig, SourceSpec};
use bodybuilding_news_ingest::ingest::fetch::{ContentFetcher, FetchedContent};
use bodybuilding_news_ingest::store::{DocumentStore, SearchResults, StoreTask};
use bodybuilding_news_ingest::{NormalizedRecord, Source, SourceKind};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct NoNetwork;

#[async_trait]
impl ContentFetcher for NoNetwork {
    async fn fetch(&self, url: &Url) -> Result<FetchedContent> {
        Err(anyhow!("no network in tests: {url}"))
    }
}

#[derive(Default)]
struct NullStore {
    docs: Mutex<Vec<NormalizedRecord>>,
}

#[async_trait]
impl DocumentStore for NullStore {
    async fn upsert_documents(
        &self,
        _index_uid: &str,
        records: &[NormalizedRecord],
    ) -> Result<StoreTask> {
        self.docs.lock().unwrap().extend_from_slice(records);
        Ok(StoreTask { task_uid: Some(1) })
    }

    async fn get_document(&self, _index_uid: &str, _id: &str) -> Result<Option<NormalizedRecord>> {
        Ok(None)
    }

    async fn search(&self, _index_uid: &str, _query: &str, _limit: usize) -> Result<SearchResults> {
        Ok(SearchResults {
            hits: Vec::new(),
            estimated_total: 0,
        })
    }
}

fn test_router(store: Option<Arc<dyn DocumentStore>>, sources: Vec<SourceSpec>) -> Router {
    let state = AppState {
        config: Arc::new(IngestConfig {
            sources,
            index_uid: "bodybuilding-test".to_string(),
            fetch_timeout_secs: 1,
        }),
        fetcher: Arc::new(NoNetwork),
        store,
        ingest_secret: Some("s3cret".to_string()),
    };
    router(state)
}

async fn body_json(resp: shuttle_axum::axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    serde_json::from_slice(&bytes).expect("parse json body")
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(Some(Arc::new(NullStore::default())), Vec::new());

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let body = String::from_utf8(bytes).expect("utf8");
    assert_eq!(body.trim(), "OK", "health body should be 'OK'");
}

#[tokio::test]
async fn api_ingest_without_token_is_unauthorized() {
    let app = test_router(Some(Arc::new(NullStore::default())), Vec::new());

    let req = Request::builder()
        .method("GET")
        .uri("/ingest")
        .body(Body::empty())
        .expect("build GET /ingest");

    let resp = app.oneshot(req).await.expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_ingest_with_wrong_token_is_unauthorized() {
    let app = test_router(Some(Arc::new(NullStore::default())), Vec::new());

    let req = Request::builder()
        .method("GET")
        .uri("/ingest?token=guess")
        .body(Body::empty())
        .expect("build GET /ingest");

    let resp = app.oneshot(req).await.expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_ingest_without_a_store_is_a_500_with_json_error() {
    let app = test_router(None, Vec::new());

    let req = Request::builder()
        .method("GET")
        .uri("/ingest?token=s3cret")
        .body(Body::empty())
        .expect("build GET /ingest");

    let resp = app.oneshot(req).await.expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let v = body_json(resp).await;
    assert!(v.get("error").is_some(), "missing 'error'");
}

#[tokio::test]
async fn api_ingest_returns_a_summary() {
    // A failing source and no working ones: the run still completes and
    // reports the failure in the summary.
    let sources = vec![SourceSpec::Resolved(Source {
        uri: Url::parse("https://down.example.com/feed/").unwrap(),
        kind: SourceKind::Feed,
        label: "down".to_string(),
        federation: None,
    })];
    let app = test_router(Some(Arc::new(NullStore::default())), sources);

    let req = Request::builder()
        .method("GET")
        .uri("/ingest?token=s3cret")
        .body(Body::empty())
        .expect("build GET /ingest");

    let resp = app.oneshot(req).await.expect("oneshot /ingest");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    assert_eq!(v["ok"], true);
    assert_eq!(v["sourcesConfigured"], 1);
    assert_eq!(v["sourcesSucceeded"], 0);
    assert_eq!(v["recordsIndexed"], 0);
    assert_eq!(v["errors"][0]["source"], "down");
}

#[tokio::test]
async fn api_debug_sources_lists_labels() {
    let sources = vec![SourceSpec::Resolved(Source {
        uri: Url::parse("https://generationiron.com/feed/").unwrap(),
        kind: SourceKind::Feed,
        label: "generationiron.com".to_string(),
        federation: None,
    })];
    let app = test_router(Some(Arc::new(NullStore::default())), sources);

    let req = Request::builder()
        .method("GET")
        .uri("/debug/sources")
        .body(Body::empty())
        .expect("build GET /debug/sources");

    let resp = app.oneshot(req).await.expect("oneshot /debug/sources");
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    assert_eq!(v, serde_json::json!(["generationiron.com"]));
}
