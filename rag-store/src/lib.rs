//! Retrieval store for the travel assistant.
//!
//! This crate provides:
//! - a typed JSON document tree and a lossless size-bounded chunker
//! - the embedding provider seam and a bounded-concurrency embedding pool
//! - the vector index seam with Qdrant and in-memory backends
//! - an idempotent index provisioner
//! - score-filtered relevance search
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use rag_store::{IndexProvisioner, RagConfig, RelevanceQuery, open_index, search_relevant};
//! # async fn run(embedder: Arc<dyn rag_store::EmbeddingsProvider>) -> Result<(), rag_store::RagError> {
//! let cfg = RagConfig::from_env()?;
//! let index = open_index(&cfg)?;
//! let provisioner = IndexProvisioner::new(cfg, index, embedder.clone());
//! let handle = provisioner.ensure_ready().await?;
//! let hits = search_relevant(&handle, embedder.as_ref(), RelevanceQuery::new("When do I land?")).await?;
//! # let _ = hits; Ok(()) }
//! ```

pub mod chunker;
pub mod config;
pub mod document;
pub mod embed;
pub mod embed_pool;
pub mod errors;
pub mod ids;
pub mod index;
pub mod progress;
pub mod provision;
pub mod search;

pub use chunker::{Chunk, JsonChunker};
pub use config::{DistanceKind, IndexBackend, RagConfig, StalePolicy};
pub use document::{Scalar, SourceDocument, TravelNode};
pub use embed::EmbeddingsProvider;
pub use embed::llm_service::LlmServiceEmbedder;
pub use errors::{RagError, RagFuture};
pub use index::{
    InMemoryIndex, IndexInfo, IndexRecord, IndexSpec, QdrantIndex, SearchResult, VectorIndex,
    VectorStoreHandle, open_index,
};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use provision::{IndexProvisioner, ProvisionState};
pub use search::{DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_K, RelevanceQuery, search_relevant};
