use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rag_store::{
    EmbeddingsProvider, InMemoryIndex, IndexBackend, IndexProvisioner, JsonChunker, RagConfig,
    RagError, RagFuture, SourceDocument, StalePolicy, VectorIndex,
};
use tempfile::NamedTempFile;

const JOURNEY: &str = r#"{
  "traveler": {"name": "Ada Lovelace", "passport": "X1234567"},
  "flights": [
    {"flight_number": "AI 101", "departure_airport": "DEL", "arrival_airport": "LHR", "departure": "2024-07-11T14:35:00"},
    {"flight_number": "BA 256", "departure_airport": "LHR", "arrival_airport": "JFK", "departure": "2024-07-15T09:10:00"}
  ],
  "hotels": [{"name": "Savoy", "city": "London", "nights": 4}]
}"#;

/// Deterministic embedder counting every text it embeds.
struct StubEmbedder {
    /// What `dimension()` reports.
    dim: usize,
    /// Length of the vectors actually returned.
    output_dim: usize,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl StubEmbedder {
    fn new(dim: usize) -> Self {
        Self {
            dim,
            output_dim: dim,
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    /// Declares `dim` but returns `output_dim`-long vectors, like a remote
    /// model that differs from the configured one.
    fn misreporting(dim: usize, output_dim: usize) -> Self {
        Self {
            output_dim,
            ..Self::new(dim)
        }
    }

    fn failing_after(dim: usize, n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::new(dim)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingsProvider for StubEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> RagFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| n >= limit) {
                return Err(RagError::Embedding("embedding endpoint returned 503".into()));
            }
            let mut v = vec![0.0f32; self.output_dim];
            for (i, b) in text.bytes().enumerate() {
                v[i % self.output_dim] += f32::from(b) / 255.0;
            }
            Ok(v)
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        "stub-embedder"
    }
}

fn write_source(raw: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(raw.as_bytes()).unwrap();
    f
}

fn config(source: &Path) -> RagConfig {
    let mut cfg = RagConfig::new_default("http://localhost:6334", "trips");
    cfg.backend = IndexBackend::Memory;
    cfg.dimension = 4;
    cfg.source_path = source.to_path_buf();
    cfg.chunk_max_chars = 160;
    cfg.embed_batch = 2;
    cfg
}

fn expected_chunks(source: &Path, max: usize) -> usize {
    let doc = SourceDocument::load(source).unwrap();
    JsonChunker::new(max).split_document(&doc).unwrap().len()
}

#[tokio::test]
async fn missing_index_is_created_and_populated() {
    let src = write_source(JOURNEY);
    let cfg = config(src.path());
    let expected = expected_chunks(src.path(), cfg.chunk_max_chars);
    assert!(expected > 1);

    let index = Arc::new(InMemoryIndex::new());
    let embedder = Arc::new(StubEmbedder::new(4));
    let provisioner = IndexProvisioner::new(cfg, index.clone(), embedder.clone());

    let handle = provisioner.ensure_ready().await.unwrap();
    assert_eq!(handle.name(), "trips");
    assert_eq!(handle.dimension(), 4);
    // One sample embedding, then every chunk.
    assert_eq!(embedder.calls(), expected + 1);

    let info = index.describe_index("trips").await.unwrap();
    assert_eq!(info.points_count as usize, expected);
    assert!(index.fingerprint("trips").await.unwrap().is_some());
}

#[tokio::test]
async fn existing_index_is_reused_without_ingestion() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());

    let first = Arc::new(StubEmbedder::new(4));
    IndexProvisioner::new(config(src.path()), index.clone(), first.clone())
        .ensure_ready()
        .await
        .unwrap();
    let count = index.describe_index("trips").await.unwrap().points_count;

    let second = Arc::new(StubEmbedder::new(4));
    let provisioner = IndexProvisioner::new(config(src.path()), index.clone(), second.clone());
    provisioner.ensure_ready().await.unwrap();
    provisioner.ensure_ready().await.unwrap();

    assert_eq!(second.calls(), 0);
    assert_eq!(index.describe_index("trips").await.unwrap().points_count, count);
}

#[tokio::test]
async fn concurrent_calls_ingest_once() {
    let src = write_source(JOURNEY);
    let cfg = config(src.path());
    let expected = expected_chunks(src.path(), cfg.chunk_max_chars);
    let embedder = Arc::new(StubEmbedder::new(4));
    let provisioner = Arc::new(IndexProvisioner::new(
        cfg,
        Arc::new(InMemoryIndex::new()),
        embedder.clone(),
    ));

    let (a, b) = tokio::join!(
        {
            let p = provisioner.clone();
            async move { p.ensure_ready().await }
        },
        {
            let p = provisioner.clone();
            async move { p.ensure_ready().await }
        }
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(embedder.calls(), expected + 1);
}

#[tokio::test]
async fn dimension_mismatch_fails_before_anything_remote() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());
    let provisioner =
        IndexProvisioner::new(config(src.path()), index.clone(), Arc::new(StubEmbedder::new(3)));

    let err = provisioner.ensure_ready().await.unwrap_err();
    assert!(matches!(err, RagError::Config(_)), "{err}");
    assert!(index.list_indexes().await.unwrap().is_empty());
}

#[tokio::test]
async fn model_output_mismatch_fails_before_index_creation() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());
    let embedder = Arc::new(StubEmbedder::misreporting(4, 1024));

    let err = IndexProvisioner::new(config(src.path()), index.clone(), embedder.clone())
        .ensure_ready()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Config(_)), "{err}");
    assert!(err.is_config());
    assert!(index.list_indexes().await.unwrap().is_empty());
    assert_eq!(embedder.calls(), 1);

    // Nothing left behind: a corrected model provisions normally.
    IndexProvisioner::new(config(src.path()), index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap();
    assert!(index.describe_index("trips").await.unwrap().points_count > 0);
}

#[tokio::test]
async fn existing_index_with_other_dimension_is_rejected() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());
    let mut small = config(src.path());
    small.dimension = 3;
    IndexProvisioner::new(small, index.clone(), Arc::new(StubEmbedder::new(3)))
        .ensure_ready()
        .await
        .unwrap();

    let err = IndexProvisioner::new(config(src.path()), index, Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Config(_)), "{err}");
}

#[tokio::test]
async fn embedding_failure_after_creation_is_partial() {
    let src = write_source(JOURNEY);
    let cfg = config(src.path());
    let expected = expected_chunks(src.path(), cfg.chunk_max_chars);
    let index = Arc::new(InMemoryIndex::new());

    let err = IndexProvisioner::new(cfg, index.clone(), Arc::new(StubEmbedder::failing_after(4, 1)))
        .ensure_ready()
        .await
        .unwrap_err();
    match err {
        RagError::ProvisioningPartial {
            index: name,
            inserted,
            expected: want,
            ..
        } => {
            assert_eq!(name, "trips");
            assert_eq!(inserted, 0);
            assert_eq!(want, expected);
        }
        other => panic!("unexpected error: {other}"),
    }
    // No rollback.
    assert_eq!(index.list_indexes().await.unwrap(), vec!["trips".to_string()]);

    // The empty index is reported on the next start...
    let err = IndexProvisioner::new(config(src.path()), index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::ProvisioningPartial { inserted: 0, .. }), "{err}");

    // ...unless re-ingestion is allowed.
    let mut cfg = config(src.path());
    cfg.stale_policy = StalePolicy::Reingest;
    IndexProvisioner::new(cfg, index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap();
    assert_eq!(
        index.describe_index("trips").await.unwrap().points_count as usize,
        expected
    );
}

#[tokio::test]
async fn oversized_leaf_creates_nothing() {
    let src = write_source(JOURNEY);
    let mut cfg = config(src.path());
    cfg.chunk_max_chars = 20;
    let index = Arc::new(InMemoryIndex::new());

    let err = IndexProvisioner::new(cfg, index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::OversizedLeaf { max: 20, .. }), "{err}");
    assert!(index.list_indexes().await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_index_policy() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());
    IndexProvisioner::new(config(src.path()), index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap();
    let old_fp = index.fingerprint("trips").await.unwrap();

    let changed = write_source(&JOURNEY.replace("Savoy", "Ritz"));

    // Warn keeps serving the old data.
    let embedder = Arc::new(StubEmbedder::new(4));
    IndexProvisioner::new(config(changed.path()), index.clone(), embedder.clone())
        .ensure_ready()
        .await
        .unwrap();
    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.fingerprint("trips").await.unwrap(), old_fp);

    // Reingest rebuilds.
    let mut cfg = config(changed.path());
    cfg.stale_policy = StalePolicy::Reingest;
    let embedder = Arc::new(StubEmbedder::new(4));
    IndexProvisioner::new(cfg, index.clone(), embedder.clone())
        .ensure_ready()
        .await
        .unwrap();
    assert!(embedder.calls() > 0);
    assert_ne!(index.fingerprint("trips").await.unwrap(), old_fp);
}

#[tokio::test]
async fn failed_rebuild_keeps_the_serving_index() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());
    IndexProvisioner::new(config(src.path()), index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap();
    let before = index.describe_index("trips").await.unwrap().points_count;
    let fp = index.fingerprint("trips").await.unwrap();

    // A lower ceiling makes the index stale and the source unchunkable.
    let mut cfg = config(src.path());
    cfg.stale_policy = StalePolicy::Reingest;
    cfg.chunk_max_chars = 20;
    let embedder = Arc::new(StubEmbedder::new(4));
    let err = IndexProvisioner::new(cfg, index.clone(), embedder.clone())
        .ensure_ready()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::OversizedLeaf { max: 20, .. }), "{err}");
    assert_eq!(embedder.calls(), 0);

    assert_eq!(index.list_indexes().await.unwrap(), vec!["trips".to_string()]);
    assert_eq!(index.describe_index("trips").await.unwrap().points_count, before);
    assert_eq!(index.fingerprint("trips").await.unwrap(), fp);
}

#[tokio::test]
async fn failed_model_check_on_rebuild_keeps_the_serving_index() {
    let src = write_source(JOURNEY);
    let index = Arc::new(InMemoryIndex::new());
    IndexProvisioner::new(config(src.path()), index.clone(), Arc::new(StubEmbedder::new(4)))
        .ensure_ready()
        .await
        .unwrap();
    let before = index.describe_index("trips").await.unwrap().points_count;

    let changed = write_source(&JOURNEY.replace("Savoy", "Ritz"));
    let mut cfg = config(changed.path());
    cfg.stale_policy = StalePolicy::Reingest;
    let err = IndexProvisioner::new(cfg, index.clone(), Arc::new(StubEmbedder::misreporting(4, 8)))
        .ensure_ready()
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Config(_)), "{err}");
    assert_eq!(index.describe_index("trips").await.unwrap().points_count, before);
}
