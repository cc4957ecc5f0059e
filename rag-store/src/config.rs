//! Runtime and index configuration.
//!
//! # Environment variables
//!
//! - `VECTOR_BACKEND` = `qdrant` (default) or `memory`
//! - `QDRANT_URL` = default `http://localhost:6334`
//! - `QDRANT_API_KEY` = optional
//! - `INDEX_NAME` = default `travel-journey`
//! - `EMBEDDING_DIM` = default `768`
//! - `TRAVEL_DATA_PATH` = default `Journey_Details.json`
//! - `CHUNK_MAX_CHARS` = default `2000`
//! - `UPSERT_BATCH` = default `128`
//! - `EMBEDDING_BATCH` = default `16`
//! - `EMBEDDING_CONCURRENCY` = default `4`
//! - `EXACT_SEARCH` = `true|false`, default `false`
//! - `STALE_INDEX_POLICY` = `warn` (default) or `reingest`

use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::RagError;

pub const DEFAULT_INDEX_NAME: &str = "travel-journey";
pub const DEFAULT_DIMENSION: usize = 768;
pub const DEFAULT_CHUNK_MAX_CHARS: usize = 2000;
pub const DEFAULT_SOURCE_PATH: &str = "Journey_Details.json";

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine similarity, scores in `[-1, 1]`.
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Where vectors are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBackend {
    Qdrant,
    /// Process-local store; rebuilt on every start.
    Memory,
}

impl FromStr for IndexBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(IndexBackend::Qdrant),
            "memory" | "in-memory" | "inmemory" => Ok(IndexBackend::Memory),
            other => Err(RagError::Config(format!("unknown VECTOR_BACKEND '{other}'"))),
        }
    }
}

/// What to do when an existing index was built from a different source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Keep serving the existing index and log a warning.
    #[default]
    Warn,
    /// Delete the index and build it again.
    Reingest,
}

impl FromStr for StalePolicy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" => Ok(StalePolicy::Warn),
            "reingest" => Ok(StalePolicy::Reingest),
            other => Err(RagError::Config(format!("unknown STALE_INDEX_POLICY '{other}'"))),
        }
    }
}

/// Configuration for index provisioning and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    pub backend: IndexBackend,
    /// Qdrant endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target index (collection) name.
    pub index_name: String,
    /// Vector dimensionality the index is created with.
    pub dimension: usize,
    pub distance: DistanceKind,
    /// Travel data document.
    pub source_path: PathBuf,
    /// Ceiling for the serialized size of one chunk.
    pub chunk_max_chars: usize,
    /// Records per upsert request.
    pub upsert_batch: usize,
    /// Texts per embedding request.
    pub embed_batch: usize,
    /// Embedding requests in flight.
    pub embed_concurrency: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    pub stale_policy: StalePolicy,
}

impl RagConfig {
    /// Creates a default config for a given index name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self {
            backend: IndexBackend::Qdrant,
            qdrant_url: url.into(),
            qdrant_api_key: None,
            index_name: index_name.into(),
            dimension: DEFAULT_DIMENSION,
            distance: DistanceKind::Cosine,
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            chunk_max_chars: DEFAULT_CHUNK_MAX_CHARS,
            upsert_batch: 128,
            embed_batch: 16,
            embed_concurrency: 4,
            exact_search: false,
            stale_policy: StalePolicy::Warn,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// [`RagError::Config`] for malformed values or a failed [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, RagError> {
        Self::from_lookup(&env_opt)
    }

    fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, RagError> {
        let mut cfg = Self::new_default(
            get("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string()),
            get("INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
        );
        cfg.qdrant_api_key = get("QDRANT_API_KEY");
        if let Some(v) = get("VECTOR_BACKEND") {
            cfg.backend = v.parse()?;
        }
        if let Some(v) = get("TRAVEL_DATA_PATH") {
            cfg.source_path = PathBuf::from(v);
        }
        if let Some(v) = get("STALE_INDEX_POLICY") {
            cfg.stale_policy = v.parse()?;
        }
        cfg.dimension = parse(get, "EMBEDDING_DIM", cfg.dimension)?;
        cfg.chunk_max_chars = parse(get, "CHUNK_MAX_CHARS", cfg.chunk_max_chars)?;
        cfg.upsert_batch = parse(get, "UPSERT_BATCH", cfg.upsert_batch)?;
        cfg.embed_batch = parse(get, "EMBEDDING_BATCH", cfg.embed_batch)?;
        cfg.embed_concurrency = parse(get, "EMBEDDING_CONCURRENCY", cfg.embed_concurrency)?;
        cfg.exact_search = parse(get, "EXACT_SEARCH", cfg.exact_search)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.backend == IndexBackend::Qdrant && self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.index_name.trim().is_empty() {
            return Err(RagError::Config("index_name is empty".into()));
        }
        if self.dimension == 0 {
            return Err(RagError::Config("dimension must be > 0".into()));
        }
        if self.chunk_max_chars < 2 {
            return Err(RagError::Config("chunk_max_chars must be >= 2".into()));
        }
        if self.upsert_batch == 0 || self.embed_batch == 0 || self.embed_concurrency == 0 {
            return Err(RagError::Config(
                "upsert_batch, embed_batch and embed_concurrency must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, RagError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(default),
    }
}
