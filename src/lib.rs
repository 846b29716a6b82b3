// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod store;

// ---- Re-exports for stable public API ----
// Convenient access to the router: `crate_root::api::router` or `crate_root::router`
pub use crate::api::{router, AppState};
pub use crate::ingest::types::{
    IngestionSummary, NormalizedRecord, RawRecord, Source, SourceKind,
};
