// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::ingest::types::{Source, SourceKind};

const ENV_SOURCES_PATH: &str = "SOURCES_PATH";
pub const ENV_MEILI_HOST: &str = "MEILI_HOST";
pub const ENV_MEILI_API_KEY: &str = "MEILI_API_KEY";
pub const ENV_MEILI_PUBLIC_KEY: &str = "MEILI_PUBLIC_KEY";
pub const ENV_INGEST_SECRET: &str = "INGEST_SECRET";

pub const DEFAULT_INDEX_UID: &str = "bodybuilding";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Everything one ingestion run needs, passed explicitly into the
/// pipeline entry point so tests can run it against fakes.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub sources: Vec<SourceSpec>,
    pub index_uid: String,
    pub fetch_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            index_uid: DEFAULT_INDEX_UID.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl IngestConfig {
    /// Load the source roster using env var + fallbacks:
    /// 1) $SOURCES_PATH
    /// 2) config/sources.toml
    /// 3) config/sources.json
    pub fn load() -> Result<Self> {
        let (sources, index) = load_sources_default()?;
        Ok(Self {
            sources,
            index_uid: index.unwrap_or_else(|| DEFAULT_INDEX_UID.to_string()),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        })
    }
}

/// A configured source, expanded from its file entry. Most expand at
/// load time; a YouTube handle needs a network round-trip to find the
/// channel id, so it stays symbolic until the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Resolved(Source),
    YoutubeHandle {
        handle: String,
        federation: Option<String>,
    },
}

impl SourceSpec {
    pub fn label(&self) -> String {
        match self {
            SourceSpec::Resolved(s) => s.label.clone(),
            SourceSpec::YoutubeHandle { handle, .. } => format!("youtube:@{handle}"),
        }
    }
}

/// Credentials for the external document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub host: String,
    pub api_key: String,
}

impl StoreConfig {
    /// Reads MEILI_HOST and MEILI_API_KEY, falling back to
    /// MEILI_PUBLIC_KEY (the hosted setup sometimes provisions only
    /// that one with write access).
    pub fn from_env() -> Result<Self> {
        let host = std::env::var(ENV_MEILI_HOST)
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("MEILI_HOST missing in env"))?;
        let api_key = std::env::var(ENV_MEILI_API_KEY)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var(ENV_MEILI_PUBLIC_KEY).ok().filter(|s| !s.is_empty()))
            .ok_or_else(|| anyhow!("MEILI_API_KEY or MEILI_PUBLIC_KEY missing in env"))?;
        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

pub fn ingest_secret_from_env() -> Option<String> {
    std::env::var(ENV_INGEST_SECRET).ok().filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    index: Option<String>,
    #[serde(default)]
    sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    uri: String,
    #[serde(default)]
    kind: Option<SourceKind>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    federation: Option<String>,
}

/// Load the source list from an explicit path. Supports TOML or JSON.
pub fn load_sources_from(path: &Path) -> Result<(Vec<SourceSpec>, Option<String>)> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let file = parse_sources(&content, ext.as_str())?;
    let specs = file
        .sources
        .into_iter()
        .map(expand_entry)
        .collect::<Result<Vec<_>>>()?;
    Ok((specs, file.index))
}

pub fn load_sources_default() -> Result<(Vec<SourceSpec>, Option<String>)> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        }
        return Err(anyhow!("SOURCES_PATH points to non-existent path"));
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok((Vec::new(), None))
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<SourcesFile> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = toml::from_str::<SourcesFile>(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<SourcesFile>(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str::<SourcesFile>(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

/// Expand shorthand notations to concrete sources:
/// - `yt:UC<channel-id>` → the channel's RSS video feed
/// - `yt:@<handle>` → resolved to a channel feed at run start
/// - `reddit:r/<sub>` → the subreddit's .rss endpoint
/// - anything else must be an absolute URL; its label defaults to the
///   hostname.
fn expand_entry(e: SourceEntry) -> Result<SourceSpec> {
    let uri = e.uri.trim();

    if let Some(rest) = uri.strip_prefix("yt:") {
        if let Some(handle) = rest.strip_prefix('@') {
            return Ok(SourceSpec::YoutubeHandle {
                handle: handle.to_string(),
                federation: e.federation,
            });
        }
        if rest.starts_with("UC") {
            let url = Url::parse(&format!(
                "https://www.youtube.com/feeds/videos.xml?channel_id={rest}"
            ))
            .context("building youtube feed url")?;
            return Ok(SourceSpec::Resolved(Source {
                label: e.label.unwrap_or_else(|| format!("youtube:{rest}")),
                uri: url,
                kind: SourceKind::Feed,
                federation: e.federation,
            }));
        }
        return Err(anyhow!("unsupported source shorthand: {uri}"));
    }

    if let Some(sub) = uri.strip_prefix("reddit:r/") {
        let url = Url::parse(&format!("https://www.reddit.com/r/{sub}/.rss"))
            .context("building subreddit feed url")?;
        return Ok(SourceSpec::Resolved(Source {
            label: e.label.unwrap_or_else(|| format!("reddit:{sub}")),
            uri: url,
            kind: SourceKind::Feed,
            federation: e.federation,
        }));
    }

    let url = Url::parse(uri).with_context(|| format!("invalid source uri: {uri}"))?;
    let label = e
        .label
        .unwrap_or_else(|| url.host_str().unwrap_or(uri).to_string());
    Ok(SourceSpec::Resolved(Source {
        label,
        uri: url,
        kind: e.kind.unwrap_or(SourceKind::Feed),
        federation: e.federation,
    }))
}
