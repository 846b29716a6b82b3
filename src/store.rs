// src/store.rs
//
// External document store client. The service is a producer for the
// bulk-upsert operation; get/search exist for the search front end and
// for poking an index by hand.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::StoreConfig;
use crate::ingest::types::NormalizedRecord;

/// Acknowledgement for a bulk submission. The store indexes
/// asynchronously; acceptance does not mean the records are searchable
/// yet, so the task uid is kept for later status inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StoreTask {
    #[serde(rename = "taskUid", alias = "uid", default)]
    pub task_uid: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub hits: Vec<NormalizedRecord>,
    #[serde(rename = "estimatedTotalHits", default)]
    pub estimated_total: u64,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Bulk-upsert `records` into `index_uid`, keyed by `id`. Partial
    /// acceptance is the store's concern; a rejected batch is an error.
    async fn upsert_documents(
        &self,
        index_uid: &str,
        records: &[NormalizedRecord],
    ) -> Result<StoreTask>;

    async fn get_document(&self, index_uid: &str, id: &str) -> Result<Option<NormalizedRecord>>;

    async fn search(&self, index_uid: &str, query: &str, limit: usize) -> Result<SearchResults>;
}

/// Meilisearch over its REST API.
pub struct MeiliStore {
    http: reqwest::Client,
    host: String,
    api_key: String,
}

impl MeiliStore {
    pub fn new(cfg: StoreConfig) -> Result<Self> {
        if cfg.host.is_empty() {
            bail!("document store host is empty");
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("building store http client")?;
        Ok(Self {
            http,
            host: cfg.host,
            api_key: cfg.api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.host.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl DocumentStore for MeiliStore {
    async fn upsert_documents(
        &self,
        index_uid: &str,
        records: &[NormalizedRecord],
    ) -> Result<StoreTask> {
        // Callers uphold the record invariant; this only trips in tests.
        debug_assert!(records.iter().all(|r| !r.title.is_empty() && !r.url.is_empty()));

        let resp = self
            .http
            .post(self.endpoint(&format!("indexes/{index_uid}/documents")))
            .bearer_auth(&self.api_key)
            .json(records)
            .send()
            .await
            .context("submitting documents to store")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("store rejected batch: {status} {body}");
        }
        resp.json::<StoreTask>().await.context("reading store task ack")
    }

    async fn get_document(&self, index_uid: &str, id: &str) -> Result<Option<NormalizedRecord>> {
        let resp = self
            .http
            .get(self.endpoint(&format!("indexes/{index_uid}/documents/{id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("fetching document from store")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            bail!("store get failed: {}", resp.status());
        }
        Ok(Some(resp.json().await.context("decoding document")?))
    }

    async fn search(&self, index_uid: &str, query: &str, limit: usize) -> Result<SearchResults> {
        let resp = self
            .http
            .post(self.endpoint(&format!("indexes/{index_uid}/search")))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "q": query, "limit": limit }))
            .send()
            .await
            .context("querying store")?;

        if !resp.status().is_success() {
            bail!("store search failed: {}", resp.status());
        }
        resp.json().await.context("decoding search results")
    }
}
