//! In-memory vector index.
//!
//! Indexes are stored as nested maps (index name → record id → record)
//! behind a `tokio::sync::RwLock`. Suitable for tests, demos and small data.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::DistanceKind;
use crate::errors::{RagError, RagFuture};
use crate::index::{
    CreateOutcome, IndexInfo, IndexRecord, IndexSpec, SearchResult, VectorIndex,
};

const BACKEND: &str = "memory";

#[derive(Debug)]
struct Collection {
    dimension: usize,
    distance: DistanceKind,
    records: BTreeMap<Uuid, IndexRecord>,
}

/// Process-local [`VectorIndex`].
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity; 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn score(distance: DistanceKind, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        DistanceKind::Cosine => cosine_similarity(a, b),
        DistanceKind::Dot => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        // Negated so that larger is still better.
        DistanceKind::Euclid => -a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

fn missing(name: &str) -> RagError {
    RagError::index(BACKEND, format!("index '{name}' does not exist"))
}

impl VectorIndex for InMemoryIndex {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn list_indexes(&self) -> RagFuture<'_, Vec<String>> {
        Box::pin(async move {
            let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
            names.sort();
            Ok(names)
        })
    }

    fn create_index<'a>(&'a self, spec: &'a IndexSpec) -> RagFuture<'a, CreateOutcome> {
        Box::pin(async move {
            let mut collections = self.collections.write().await;
            if collections.contains_key(&spec.name) {
                return Ok(CreateOutcome::AlreadyExists);
            }
            collections.insert(
                spec.name.clone(),
                Collection {
                    dimension: spec.dimension,
                    distance: spec.distance,
                    records: BTreeMap::new(),
                },
            );
            Ok(CreateOutcome::Created)
        })
    }

    fn describe_index<'a>(&'a self, name: &'a str) -> RagFuture<'a, IndexInfo> {
        Box::pin(async move {
            let collections = self.collections.read().await;
            let c = collections.get(name).ok_or_else(|| missing(name))?;
            Ok(IndexInfo {
                name: name.to_string(),
                dimension: c.dimension,
                distance: c.distance,
                points_count: c.records.len() as u64,
            })
        })
    }

    fn delete_index<'a>(&'a self, name: &'a str) -> RagFuture<'a, ()> {
        Box::pin(async move {
            self.collections.write().await.remove(name);
            Ok(())
        })
    }

    fn upsert<'a>(&'a self, name: &'a str, records: &'a [IndexRecord]) -> RagFuture<'a, usize> {
        Box::pin(async move {
            let mut collections = self.collections.write().await;
            let c = collections.get_mut(name).ok_or_else(|| missing(name))?;
            if let Some(r) = records.iter().find(|r| r.vector.len() != c.dimension) {
                return Err(RagError::VectorSizeMismatch {
                    got: r.vector.len(),
                    want: c.dimension,
                });
            }
            for r in records {
                c.records.insert(r.id, r.clone());
            }
            Ok(records.len())
        })
    }

    fn search<'a>(
        &'a self,
        name: &'a str,
        vector: &'a [f32],
        k: usize,
    ) -> RagFuture<'a, Vec<SearchResult>> {
        Box::pin(async move {
            let collections = self.collections.read().await;
            let c = collections.get(name).ok_or_else(|| missing(name))?;
            let mut scored: Vec<SearchResult> = c
                .records
                .values()
                .map(|r| SearchResult {
                    text: r.text.clone(),
                    score: score(c.distance, &r.vector, vector),
                })
                .collect();
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(k);
            Ok(scored)
        })
    }

    fn fingerprint<'a>(&'a self, name: &'a str) -> RagFuture<'a, Option<String>> {
        Box::pin(async move {
            let collections = self.collections.read().await;
            let c = collections.get(name).ok_or_else(|| missing(name))?;
            Ok(c.records.values().next().map(|r| r.metadata.fingerprint.clone()))
        })
    }
}
