//! Vector index boundary and its backends.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::config::{DistanceKind, IndexBackend, RagConfig};
use crate::errors::{RagError, RagFuture};

pub mod memory;
pub mod qdrant;

pub use memory::InMemoryIndex;
pub use qdrant::QdrantIndex;

/// Shape of an index to create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceKind,
}

/// Result of [`VectorIndex::create_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Someone else created it first; treated as success.
    AlreadyExists,
}

/// Description of an existing index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceKind,
    pub points_count: u64,
}

/// Payload stored next to each vector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub chunk_index: usize,
    pub source: String,
    pub fingerprint: String,
}

/// One stored chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexRecord {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: RecordMetadata,
}

/// One search hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    pub text: String,
    pub score: f32,
}

/// Persistent store of `(vector, text, metadata)` records with similarity search.
pub trait VectorIndex: Send + Sync {
    /// Short backend name for logs and errors.
    fn backend(&self) -> &'static str;

    fn list_indexes(&self) -> RagFuture<'_, Vec<String>>;

    fn create_index<'a>(&'a self, spec: &'a IndexSpec) -> RagFuture<'a, CreateOutcome>;

    fn describe_index<'a>(&'a self, name: &'a str) -> RagFuture<'a, IndexInfo>;

    fn delete_index<'a>(&'a self, name: &'a str) -> RagFuture<'a, ()>;

    /// Inserts or overwrites records by id; returns how many were written.
    fn upsert<'a>(&'a self, name: &'a str, records: &'a [IndexRecord]) -> RagFuture<'a, usize>;

    /// Up to `k` nearest records, best first.
    fn search<'a>(
        &'a self,
        name: &'a str,
        vector: &'a [f32],
        k: usize,
    ) -> RagFuture<'a, Vec<SearchResult>>;

    /// Source fingerprint stored with the records, `None` for an empty index.
    fn fingerprint<'a>(&'a self, name: &'a str) -> RagFuture<'a, Option<String>>;
}

/// Builds the backend selected in the config.
///
/// # Errors
/// [`RagError::Config`] / [`RagError::Index`] if the Qdrant client cannot be built.
pub fn open_index(cfg: &RagConfig) -> Result<Arc<dyn VectorIndex>, RagError> {
    cfg.validate()?;
    Ok(match cfg.backend {
        IndexBackend::Qdrant => Arc::new(QdrantIndex::new(cfg)?),
        IndexBackend::Memory => Arc::new(InMemoryIndex::new()),
    })
}

/// A provisioned index, ready for queries.
#[derive(Clone)]
pub struct VectorStoreHandle {
    index: Arc<dyn VectorIndex>,
    name: String,
    dimension: usize,
}

impl std::fmt::Debug for VectorStoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStoreHandle")
            .field("backend", &self.index.backend())
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl VectorStoreHandle {
    pub fn new(index: Arc<dyn VectorIndex>, name: impl Into<String>, dimension: usize) -> Self {
        Self {
            index,
            name: name.into(),
            dimension,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Nearest neighbors of `vector`.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] if the query has the wrong length.
    pub async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>, RagError> {
        if vector.len() != self.dimension {
            return Err(RagError::VectorSizeMismatch {
                got: vector.len(),
                want: self.dimension,
            });
        }
        trace!(index = %self.name, k, "vector search");
        self.index.search(&self.name, vector, k).await
    }
}
