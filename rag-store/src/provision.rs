//! Idempotent index setup: check → chunk → sample embedding → create →
//! embed → populate, or connect to an existing index without re-ingesting.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::chunker::{Chunk, JsonChunker};
use crate::config::{RagConfig, StalePolicy};
use crate::document::SourceDocument;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::RagError;
use crate::ids::stable_uuid;
use crate::index::{
    CreateOutcome, IndexRecord, IndexSpec, RecordMetadata, VectorIndex, VectorStoreHandle,
};
use crate::progress::{NoopProgress, Progress};

/// Provisioning state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionState {
    Checking,
    Exists,
    Missing,
    Creating,
    Ingesting,
    Connected,
}

impl fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProvisionState::Checking => "checking",
            ProvisionState::Exists => "exists",
            ProvisionState::Missing => "missing",
            ProvisionState::Creating => "creating",
            ProvisionState::Ingesting => "ingesting",
            ProvisionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// Fingerprint stored with every record: source content, chunk ceiling and
/// embedding model. A change in any of them makes the index stale.
pub fn build_fingerprint(doc: &SourceDocument, chunk_max_chars: usize, model: &str) -> String {
    let mut h = blake3::Hasher::new();
    h.update(doc.fingerprint.as_bytes());
    h.update(&(chunk_max_chars as u64).to_le_bytes());
    h.update(model.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Brings the configured index to a queryable state.
///
/// Concurrent [`ensure_ready`](Self::ensure_ready) calls on one provisioner
/// are serialized; the first successful handle is cached.
pub struct IndexProvisioner {
    cfg: RagConfig,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    progress: Arc<dyn Progress>,
    ready: Mutex<Option<VectorStoreHandle>>,
}

/// Chunks of the source plus the fingerprint they will be stored with.
struct Prepared {
    source: String,
    fingerprint: String,
    chunks: Vec<Chunk>,
}

impl IndexProvisioner {
    pub fn new(
        cfg: RagConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Self {
        Self {
            cfg,
            index,
            embedder,
            progress: Arc::new(NoopProgress),
            ready: Mutex::new(None),
        }
    }

    /// Reports embedding progress (e.g. an indicatif bar in CLI mode).
    pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    /// Returns a handle to the configured index, creating and populating it
    /// on first use.
    ///
    /// # Errors
    /// - [`RagError::Config`] for a dimension mismatch between provider,
    ///   configuration and existing index
    /// - [`RagError::OversizedLeaf`], [`RagError::Io`], [`RagError::Parse`]
    ///   for unusable source data
    /// - [`RagError::ProvisioningPartial`] if population failed after creation
    /// - [`RagError::Index`] if the backend is unreachable
    pub async fn ensure_ready(&self) -> Result<VectorStoreHandle, RagError> {
        let mut ready = self.ready.lock().await;
        if let Some(handle) = ready.as_ref() {
            debug!(index = %self.cfg.index_name, "index already provisioned");
            return Ok(handle.clone());
        }
        let handle = self.provision().await?;
        *ready = Some(handle.clone());
        Ok(handle)
    }

    fn transition(&self, state: ProvisionState) {
        info!(index = %self.cfg.index_name, backend = self.index.backend(), %state, "provisioning");
    }

    async fn provision(&self) -> Result<VectorStoreHandle, RagError> {
        let name = self.cfg.index_name.as_str();
        let provider_dim = self.embedder.dimension();
        if provider_dim != self.cfg.dimension {
            return Err(RagError::Config(format!(
                "embedding model '{}' produces {provider_dim}-d vectors but the index is configured for {}",
                self.embedder.model_id(),
                self.cfg.dimension
            )));
        }

        self.transition(ProvisionState::Checking);
        let names = self.index.list_indexes().await?;

        let rebuild = if names.iter().any(|n| n == name) {
            self.transition(ProvisionState::Exists);
            if self.check_existing().await? {
                self.transition(ProvisionState::Connected);
                return Ok(self.handle());
            }
            true
        } else {
            self.transition(ProvisionState::Missing);
            false
        };

        // Source and model are both checked before the index is touched.
        let prepared = self.prepare()?;
        self.verify_model_output(&prepared).await?;

        if rebuild {
            warn!(index = name, "rebuilding index");
            self.index.delete_index(name).await?;
        }
        self.create_and_ingest(prepared).await?;
        self.transition(ProvisionState::Connected);
        Ok(self.handle())
    }

    /// Embeds the first chunk and compares the vector length with the
    /// configured dimension.
    async fn verify_model_output(&self, prepared: &Prepared) -> Result<(), RagError> {
        let sample = prepared.chunks.first().map_or("{}", |c| c.text.as_str());
        let got = self.embedder.embed(sample).await?.len();
        if got != self.cfg.dimension {
            let err = RagError::Config(format!(
                "embedding model '{}' returned {got}-d vectors but the index is configured for {}",
                self.embedder.model_id(),
                self.cfg.dimension
            ));
            error!(index = %self.cfg.index_name, error = %err, "embedding model does not match index");
            return Err(err);
        }
        debug!(dimension = got, "embedding model output matches index");
        Ok(())
    }

    /// `Ok(true)` to serve the existing index, `Ok(false)` to rebuild it.
    async fn check_existing(&self) -> Result<bool, RagError> {
        let name = self.cfg.index_name.as_str();
        let info = self.index.describe_index(name).await?;
        if info.dimension != self.cfg.dimension {
            return Err(RagError::Config(format!(
                "index '{name}' has dimension {} but {} is configured",
                info.dimension, self.cfg.dimension
            )));
        }

        let reingest = self.cfg.stale_policy == StalePolicy::Reingest;
        if info.points_count == 0 {
            if reingest {
                warn!(index = name, "existing index is empty");
                return Ok(false);
            }
            let expected = self.prepare().map(|p| p.chunks.len()).unwrap_or(0);
            let err = RagError::ProvisioningPartial {
                index: name.to_string(),
                inserted: 0,
                expected,
                reason: "index exists but holds no records".into(),
            };
            error!(index = name, error = %err, "existing index unusable");
            return Err(err);
        }

        let current = match SourceDocument::load(&self.cfg.source_path) {
            Ok(doc) => build_fingerprint(&doc, self.cfg.chunk_max_chars, self.embedder.model_id()),
            Err(e) => {
                warn!(index = name, error = %e, "source unavailable, skipping staleness check");
                return Ok(true);
            }
        };
        let stored = self.index.fingerprint(name).await?;
        if stored.as_deref() == Some(current.as_str()) {
            debug!(index = name, points = info.points_count, "index is up to date");
            return Ok(true);
        }

        match self.cfg.stale_policy {
            StalePolicy::Warn => {
                warn!(
                    index = name,
                    stored = stored.as_deref().unwrap_or("none"),
                    current = %current,
                    "index was built from different source data; serving it anyway"
                );
                Ok(true)
            }
            StalePolicy::Reingest => {
                warn!(index = name, "index is stale");
                Ok(false)
            }
        }
    }

    /// Loads and chunks the source; nothing remote happens here.
    fn prepare(&self) -> Result<Prepared, RagError> {
        let doc = SourceDocument::load(&self.cfg.source_path)?;
        let chunks = JsonChunker::new(self.cfg.chunk_max_chars).split_document(&doc)?;
        Ok(Prepared {
            fingerprint: build_fingerprint(&doc, self.cfg.chunk_max_chars, self.embedder.model_id()),
            source: doc.source,
            chunks,
        })
    }

    async fn create_and_ingest(&self, prepared: Prepared) -> Result<(), RagError> {
        let name = self.cfg.index_name.as_str();
        self.transition(ProvisionState::Creating);
        let spec = IndexSpec {
            name: name.to_string(),
            dimension: self.cfg.dimension,
            distance: self.cfg.distance,
        };
        if self.index.create_index(&spec).await? == CreateOutcome::AlreadyExists {
            info!(index = name, "index appeared concurrently; upserts are idempotent");
        }

        self.transition(ProvisionState::Ingesting);
        let expected = prepared.chunks.len();
        let mut inserted = 0usize;
        match self.ingest(&prepared, &mut inserted).await {
            Ok(()) => {
                info!(index = name, records = inserted, "ingestion complete");
                Ok(())
            }
            Err(e) => {
                let err = RagError::ProvisioningPartial {
                    index: name.to_string(),
                    inserted,
                    expected,
                    reason: e.to_string(),
                };
                error!(index = name, inserted, expected, error = %e, "ingestion failed after index creation");
                Err(err)
            }
        }
    }

    async fn ingest(&self, prepared: &Prepared, inserted: &mut usize) -> Result<(), RagError> {
        let texts: Vec<String> = prepared.chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_all(
            &texts,
            self.embedder.as_ref(),
            self.cfg.dimension,
            self.cfg.embed_batch,
            self.cfg.embed_concurrency,
            self.progress.as_ref(),
        )
        .await?;
        self.progress.finish("embedded");

        let records: Vec<IndexRecord> = prepared
            .chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexRecord {
                id: stable_uuid(&self.cfg.index_name, chunk.ordinal, &chunk.text),
                vector,
                text: chunk.text.clone(),
                metadata: RecordMetadata {
                    chunk_index: chunk.ordinal,
                    source: prepared.source.clone(),
                    fingerprint: prepared.fingerprint.clone(),
                },
            })
            .collect();

        for batch in records.chunks(self.cfg.upsert_batch) {
            *inserted += self.index.upsert(&self.cfg.index_name, batch).await?;
            debug!(inserted = *inserted, total = records.len(), "batch upserted");
        }
        Ok(())
    }

    fn handle(&self) -> VectorStoreHandle {
        VectorStoreHandle::new(self.index.clone(), self.cfg.index_name.clone(), self.cfg.dimension)
    }
}
