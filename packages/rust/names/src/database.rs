//! Chunked name database.
//!
//! The full dataset is split into JSON chunks described by `names-index.json`.
//! A [`NameDatabase`] starts from a small fallback list, swaps it for the
//! core chunk once that loads, then appends further chunks on demand.
//! Construction never touches the source; loading is always explicit.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};
use url::Url;

use soulseed_shared::{NamesConfig, Result, SoulseedError};

use crate::origins::ConsolidationReport;

const USER_AGENT: &str = concat!("SoulSeed/", env!("CARGO_PKG_VERSION"));

const INDEX_FILE: &str = "names-index.json";
const CORE_FILE: &str = "names-core.json";
const CORE_CHUNK: &str = "core";

// ---------------------------------------------------------------------------
// Data files
// ---------------------------------------------------------------------------

/// One name in the database. Fields this service does not use are kept in
/// `extra` so entries round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameEntry {
    pub name: String,
    /// Either a label (`"female"`) or a weight map (`{"Male": 0.2, "Female": 0.8}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NameEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender: None,
            origin: None,
            origin_group: None,
            meaning: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Location of one chunk, as listed in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkInfo {
    pub file: String,
    #[serde(default)]
    pub file_gz: Option<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default)]
    pub end_index: usize,
}

/// `names-index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseIndex {
    #[serde(default)]
    pub version: String,
    pub total_names: usize,
    pub chunks: BTreeMap<String, ChunkInfo>,
}

/// Chunk files come either wrapped (`{"names": [...]}`) or as a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChunkFile {
    Wrapped { names: Vec<NameEntry> },
    Bare(Vec<NameEntry>),
}

impl ChunkFile {
    fn into_names(self) -> Vec<NameEntry> {
        match self {
            Self::Wrapped { names } | Self::Bare(names) => names,
        }
    }
}

// ---------------------------------------------------------------------------
// Chunk source
// ---------------------------------------------------------------------------

/// Where chunk files are read from.
#[derive(Debug, Clone)]
pub enum ChunkSource {
    /// A local directory (e.g. `public/data`).
    Dir(PathBuf),
    /// A base URL the file names are joined onto.
    Http { client: Client, base: Url },
}

impl ChunkSource {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self::Dir(path.into())
    }

    pub fn http(base_url: &str) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized)
            .map_err(|e| SoulseedError::config(format!("invalid names base_url {base_url}: {e}")))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SoulseedError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::Http { client, base })
    }

    /// Pick the source configured in `[names]`.
    pub fn from_config(config: &NamesConfig) -> Result<Self> {
        match &config.base_url {
            Some(url) => Self::http(url),
            None => Ok(Self::dir(&config.data_dir)),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        match self {
            Self::Dir(dir) => {
                let path = dir.join(file);
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| SoulseedError::io(&path, e))?;
                serde_json::from_str(&content)
                    .map_err(|e| SoulseedError::parse(format!("{}: {e}", path.display())))
            }
            Self::Http { client, base } => {
                let url = base
                    .join(file)
                    .map_err(|e| SoulseedError::parse(format!("bad chunk path {file}: {e}")))?;
                let response = client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| SoulseedError::Network(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SoulseedError::Network(format!("HTTP {status} for {url}")));
                }
                response
                    .json()
                    .await
                    .map_err(|e| SoulseedError::parse(format!("{url}: {e}")))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

/// Load progress, as reported by [`NameDatabase::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub loaded_names: usize,
    /// From the index; falls back to `loaded_names` before the index loads.
    pub total_names: usize,
    pub loaded_chunks: usize,
    pub total_chunks: usize,
}

/// In-memory name database fed from chunk files.
pub struct NameDatabase {
    source: ChunkSource,
    entries: Vec<NameEntry>,
    seen: HashSet<String>,
    loaded: BTreeSet<String>,
    index: Option<DatabaseIndex>,
    consolidation: ConsolidationReport,
}

impl NameDatabase {
    /// Start with `fallback` so lookups work before anything loads.
    pub fn new(fallback: Vec<NameEntry>, source: ChunkSource) -> Self {
        let mut db = Self {
            source,
            entries: Vec::new(),
            seen: HashSet::new(),
            loaded: BTreeSet::new(),
            index: None,
            consolidation: ConsolidationReport::default(),
        };
        db.append(fallback);
        db
    }

    async fn ensure_index(&mut self) -> Result<&DatabaseIndex> {
        if self.index.is_none() {
            let index: DatabaseIndex = self.source.fetch_json(INDEX_FILE).await?;
            info!(
                total_names = index.total_names,
                chunks = index.chunks.len(),
                "name index loaded"
            );
            self.index = Some(index);
        }
        self.index
            .as_ref()
            .ok_or_else(|| SoulseedError::Storage("name index unavailable".into()))
    }

    /// Load the index and the core chunk. Core names replace the fallback.
    /// On failure the current entries are left untouched.
    #[instrument(skip_all)]
    pub async fn load_core(&mut self) -> Result<usize> {
        if self.loaded.contains(CORE_CHUNK) {
            return Ok(0);
        }

        let loaded = async {
            self.ensure_index().await?;
            let chunk: ChunkFile = self.source.fetch_json(CORE_FILE).await?;
            Ok::<_, SoulseedError>(chunk.into_names())
        }
        .await;

        match loaded {
            Ok(names) => {
                self.entries.clear();
                self.seen.clear();
                let added = self.append(names);
                self.loaded.insert(CORE_CHUNK.to_string());
                info!(names = added, "core chunk loaded");
                Ok(added)
            }
            Err(e) => {
                warn!(error = %e, fallback = self.entries.len(), "core chunk failed, keeping fallback names");
                Err(e)
            }
        }
    }

    /// Load one chunk by its index key, appending names not already present.
    /// Returns how many names were added; a chunk is never loaded twice.
    #[instrument(skip(self))]
    pub async fn load_chunk(&mut self, chunk: &str) -> Result<usize> {
        if chunk == CORE_CHUNK {
            return self.load_core().await;
        }
        if self.loaded.contains(chunk) {
            return Ok(0);
        }

        let file = self
            .ensure_index()
            .await?
            .chunks
            .get(chunk)
            .map(|info| info.file.clone())
            .ok_or_else(|| SoulseedError::NotFound(format!("chunk {chunk} not in index")))?;

        let payload: ChunkFile = self.source.fetch_json(&file).await?;
        let names = payload.into_names();
        let fetched = names.len();
        let added = self.append(names);
        self.loaded.insert(chunk.to_string());
        info!(fetched, added, total = self.entries.len(), "chunk loaded");
        Ok(added)
    }

    /// Load every non-core chunk in index order. A failing chunk is logged
    /// and skipped so one bad file does not hide the rest.
    pub async fn load_all(&mut self) -> Result<usize> {
        let mut chunks: Vec<(String, usize)> = self
            .ensure_index()
            .await?
            .chunks
            .iter()
            .filter(|(name, _)| name.as_str() != CORE_CHUNK)
            .map(|(name, info)| (name.clone(), info.start_index))
            .collect();
        chunks.sort_by_key(|(_, start)| *start);

        let mut added = 0;
        for (name, _) in chunks {
            match self.load_chunk(&name).await {
                Ok(n) => added += n,
                Err(e) => warn!(chunk = %name, error = %e, "chunk load failed"),
            }
        }
        Ok(added)
    }

    fn append(&mut self, names: Vec<NameEntry>) -> usize {
        let before = self.entries.len();
        for mut entry in names {
            if self.seen.insert(entry.name.to_lowercase()) {
                self.consolidation.apply(&mut entry.origin_group);
                self.entries.push(entry);
            }
        }
        self.entries.len() - before
    }

    pub fn names(&self) -> &[NameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<&NameEntry> {
        let needle = name.to_lowercase();
        self.entries.iter().find(|e| e.name.to_lowercase() == needle)
    }

    /// Case-insensitive search ranked exact, then prefix, then substring.
    pub fn search(&self, term: &str) -> Vec<&NameEntry> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut exact = Vec::new();
        let mut prefix = Vec::new();
        let mut contains = Vec::new();
        for entry in &self.entries {
            let name = entry.name.to_lowercase();
            if name == needle {
                exact.push(entry);
            } else if name.starts_with(&needle) {
                prefix.push(entry);
            } else if name.contains(&needle) {
                contains.push(entry);
            }
        }
        exact.extend(prefix);
        exact.extend(contains);
        exact
    }

    pub fn status(&self) -> DatabaseStatus {
        DatabaseStatus {
            loaded_names: self.entries.len(),
            total_names: self
                .index
                .as_ref()
                .map_or(self.entries.len(), |i| i.total_names),
            loaded_chunks: self.loaded.len(),
            total_chunks: self.index.as_ref().map_or(0, |i| i.chunks.len()),
        }
    }

    /// Origin groups rewritten while loading.
    pub fn consolidation(&self) -> &ConsolidationReport {
        &self.consolidation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(name: &str, group: Option<&str>) -> serde_json::Value {
        match group {
            Some(g) => serde_json::json!({ "name": name, "originGroup": g, "popularity": 3 }),
            None => serde_json::json!({ "name": name }),
        }
    }

    /// Write an index, a core chunk and two extra chunks to a temp dir.
    fn fixture_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ss_names_{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let index = serde_json::json!({
            "version": "3",
            "totalNames": 5,
            "chunks": {
                "core": { "file": "names-core.json", "fileGz": "names-core.json.gz", "count": 2, "startIndex": 0, "endIndex": 2 },
                "chunk2": { "file": "names-chunk2.json", "count": 2, "startIndex": 4, "endIndex": 6 },
                "chunk1": { "file": "names-chunk1.json", "count": 2, "startIndex": 2, "endIndex": 4 }
            }
        });
        let core = serde_json::json!({ "names": [entry("Luna", Some("Latin")), entry("Oliver", Some("Old English"))] });
        let chunk1 = serde_json::json!([entry("luna", None), entry("Aurora", Some("Latin"))]);
        let chunk2 = serde_json::json!({ "names": [entry("Emma", Some("Germanic")), entry("Zara", Some("Arabic"))] });
        for (file, body) in [
            ("names-index.json", index),
            ("names-core.json", core),
            ("names-chunk1.json", chunk1),
            ("names-chunk2.json", chunk2),
        ] {
            std::fs::write(dir.join(file), body.to_string()).unwrap();
        }
        dir
    }

    fn fallback() -> Vec<NameEntry> {
        vec![NameEntry::new("Fallback"), NameEntry::new("Ava")]
    }

    #[test]
    fn construction_has_no_side_effects() {
        let db = NameDatabase::new(fallback(), ChunkSource::dir("/nonexistent"));
        assert_eq!(db.len(), 2);
        assert_eq!(
            db.status(),
            DatabaseStatus {
                loaded_names: 2,
                total_names: 2,
                loaded_chunks: 0,
                total_chunks: 0
            }
        );
    }

    #[tokio::test]
    async fn core_replaces_fallback() {
        let mut db = NameDatabase::new(fallback(), ChunkSource::dir(fixture_dir()));
        let added = db.load_core().await.expect("core");
        assert_eq!(added, 2);
        assert!(!db.contains("Fallback"));
        assert!(db.contains("LUNA"));
        // Consolidated on insert.
        assert_eq!(db.get("oliver").unwrap().origin_group.as_deref(), Some("English"));
        // Unknown fields survive.
        assert_eq!(db.get("Luna").unwrap().extra["popularity"], 3);
    }

    #[tokio::test]
    async fn core_failure_keeps_fallback() {
        let mut db = NameDatabase::new(fallback(), ChunkSource::dir("/nonexistent/names"));
        assert!(db.load_core().await.is_err());
        assert_eq!(db.len(), 2);
        assert!(db.contains("fallback"));
    }

    #[tokio::test]
    async fn chunks_dedupe_case_insensitively_and_load_once() {
        let mut db = NameDatabase::new(fallback(), ChunkSource::dir(fixture_dir()));
        db.load_core().await.unwrap();

        assert_eq!(db.load_chunk("chunk1").await.unwrap(), 1);
        assert_eq!(db.load_chunk("chunk1").await.unwrap(), 0);
        assert_eq!(db.len(), 3);

        let err = db.load_chunk("chunk9").await.unwrap_err();
        assert!(matches!(err, SoulseedError::NotFound(_)));
    }

    #[tokio::test]
    async fn load_all_follows_index_order() {
        let mut db = NameDatabase::new(fallback(), ChunkSource::dir(fixture_dir()));
        db.load_core().await.unwrap();
        let added = db.load_all().await.unwrap();
        assert_eq!(added, 3);

        let names: Vec<&str> = db.names().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Luna", "Oliver", "Aurora", "Emma", "Zara"]);
        assert_eq!(
            db.status(),
            DatabaseStatus {
                loaded_names: 5,
                total_names: 5,
                loaded_chunks: 3,
                total_chunks: 3
            }
        );
        assert_eq!(db.consolidation().changed(), 3);
    }

    #[test]
    fn search_ranks_exact_prefix_contains() {
        let names = ["Annabel", "Hannah", "Ann", "Anna", "Joanne", "Bob"]
            .into_iter()
            .map(NameEntry::new)
            .collect();
        let db = NameDatabase::new(names, ChunkSource::dir("."));
        let hits: Vec<&str> = db.search("ann").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(hits, vec!["Ann", "Annabel", "Anna", "Hannah", "Joanne"]);
        assert!(db.search("  ").is_empty());
    }

    #[tokio::test]
    async fn loads_over_http() {
        let server = MockServer::start().await;
        let dir = fixture_dir();
        for file in ["names-index.json", "names-core.json", "names-chunk1.json"] {
            let body = std::fs::read_to_string(dir.join(file)).unwrap();
            Mock::given(method("GET"))
                .and(path(format!("/data/{file}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }

        let source = ChunkSource::http(&format!("{}/data", server.uri())).unwrap();
        let mut db = NameDatabase::new(fallback(), source);
        db.load_core().await.expect("core over http");
        db.load_chunk("chunk1").await.expect("chunk1 over http");
        assert!(db.contains("Aurora"));

        // chunk2 is not mounted: 404 surfaces as a network error.
        let err = db.load_chunk("chunk2").await.unwrap_err();
        assert!(matches!(err, SoulseedError::Network(_)));
    }
}
