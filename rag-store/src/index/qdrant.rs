//! Qdrant backend for [`VectorIndex`].
//!
//! Concentrates all `qdrant-client` usage behind the trait, hiding the
//! builder API from the rest of the crate.

use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, ScrollPointsBuilder,
    SearchParamsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, RagConfig};
use crate::errors::{RagError, RagFuture};
use crate::index::{CreateOutcome, IndexInfo, IndexRecord, IndexSpec, SearchResult, VectorIndex};

const BACKEND: &str = "qdrant";

/// [`VectorIndex`] over a Qdrant server; one index is one collection.
pub struct QdrantIndex {
    client: Qdrant,
    exact_search: bool,
}

impl QdrantIndex {
    /// Creates the client; no request is made yet.
    ///
    /// Supports optional API key authentication.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(|e| RagError::index(BACKEND, e))?;
        info!(url = %cfg.qdrant_url, "qdrant client ready");
        Ok(Self {
            client,
            exact_search: cfg.exact_search,
        })
    }
}

fn to_qdrant(d: DistanceKind) -> Distance {
    match d {
        DistanceKind::Cosine => Distance::Cosine,
        DistanceKind::Dot => Distance::Dot,
        DistanceKind::Euclid => Distance::Euclid,
    }
}

fn from_qdrant(raw: i32) -> Option<DistanceKind> {
    match Distance::try_from(raw).ok()? {
        Distance::Cosine => Some(DistanceKind::Cosine),
        Distance::Dot => Some(DistanceKind::Dot),
        Distance::Euclid => Some(DistanceKind::Euclid),
        _ => None,
    }
}

fn string_field(payload: &std::collections::HashMap<String, QValue>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn to_point(r: &IndexRecord) -> Result<PointStruct, RagError> {
    let payload = Payload::try_from(serde_json::json!({
        "text": r.text,
        "chunk_index": r.metadata.chunk_index,
        "source": r.metadata.source,
        "fingerprint": r.metadata.fingerprint,
    }))
    .map_err(|e| RagError::index(BACKEND, e))?;
    Ok(PointStruct::new(r.id.to_string(), r.vector.clone(), payload))
}

impl VectorIndex for QdrantIndex {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn list_indexes(&self) -> RagFuture<'_, Vec<String>> {
        Box::pin(async move {
            let res = self
                .client
                .list_collections()
                .await
                .map_err(|e| RagError::index(BACKEND, e))?;
            Ok(res.collections.into_iter().map(|c| c.name).collect())
        })
    }

    fn create_index<'a>(&'a self, spec: &'a IndexSpec) -> RagFuture<'a, CreateOutcome> {
        Box::pin(async move {
            info!(
                collection = %spec.name,
                size = spec.dimension,
                distance = ?spec.distance,
                "creating collection"
            );
            let res = self
                .client
                .create_collection(CreateCollectionBuilder::new(&spec.name).vectors_config(
                    VectorParamsBuilder::new(spec.dimension as u64, to_qdrant(spec.distance)),
                ))
                .await;
            match res {
                Ok(_) => Ok(CreateOutcome::Created),
                Err(e) if e.to_string().contains("already exists") => {
                    warn!(collection = %spec.name, "collection created concurrently, reusing it");
                    Ok(CreateOutcome::AlreadyExists)
                }
                Err(e) => Err(RagError::index(BACKEND, e)),
            }
        })
    }

    fn describe_index<'a>(&'a self, name: &'a str) -> RagFuture<'a, IndexInfo> {
        Box::pin(async move {
            let info = self
                .client
                .collection_info(name)
                .await
                .map_err(|e| RagError::index(BACKEND, e))?
                .result
                .ok_or_else(|| RagError::index(BACKEND, format!("no info for '{name}'")))?;

            let params = info
                .config
                .and_then(|c| c.params)
                .and_then(|p| p.vectors_config)
                .and_then(|v| v.config);
            let (dimension, distance) = match params {
                Some(VectorsConfigKind::Params(p)) => (p.size as usize, from_qdrant(p.distance)),
                _ => {
                    return Err(RagError::Config(format!(
                        "collection '{name}' does not use a single unnamed vector"
                    )));
                }
            };
            let distance = distance.ok_or_else(|| {
                RagError::Config(format!("collection '{name}' uses an unsupported distance"))
            })?;

            let count = self
                .client
                .count(CountPointsBuilder::new(name).exact(true))
                .await
                .map_err(|e| RagError::index(BACKEND, e))?
                .result
                .map(|r| r.count)
                .unwrap_or(0);

            debug!(collection = name, dimension, points = count, "collection described");
            Ok(IndexInfo {
                name: name.to_string(),
                dimension,
                distance,
                points_count: count,
            })
        })
    }

    fn delete_index<'a>(&'a self, name: &'a str) -> RagFuture<'a, ()> {
        Box::pin(async move {
            self.client
                .delete_collection(name)
                .await
                .map_err(|e| RagError::index(BACKEND, e))?;
            info!(collection = name, "collection deleted");
            Ok(())
        })
    }

    fn upsert<'a>(&'a self, name: &'a str, records: &'a [IndexRecord]) -> RagFuture<'a, usize> {
        Box::pin(async move {
            if records.is_empty() {
                debug!("no points provided for upsert");
                return Ok(0);
            }
            let points = records.iter().map(to_point).collect::<Result<Vec<_>, _>>()?;
            self.client
                .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
                .await
                .map_err(|e| RagError::index(BACKEND, e))?;
            debug!(collection = name, count = records.len(), "points upserted");
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
            let mut builder =
                SearchPointsBuilder::new(name, vector.to_vec(), k as u64).with_payload(true);
            if self.exact_search {
                builder = builder.params(SearchParamsBuilder::default().exact(true));
            }
            let res = self
                .client
                .search_points(builder)
                .await
                .map_err(|e| RagError::index(BACKEND, e))?;

            let hits: Vec<SearchResult> = res
                .result
                .into_iter()
                .map(|p| SearchResult {
                    text: string_field(&p.payload, "text").unwrap_or_default(),
                    score: p.score,
                })
                .collect();
            debug!(collection = name, hits = hits.len(), "search completed");
            Ok(hits)
        })
    }

    fn fingerprint<'a>(&'a self, name: &'a str) -> RagFuture<'a, Option<String>> {
        Box::pin(async move {
            let res = self
                .client
                .scroll(ScrollPointsBuilder::new(name).limit(1).with_payload(true))
                .await
                .map_err(|e| RagError::index(BACKEND, e))?;
            Ok(res
                .result
                .first()
                .and_then(|p| string_field(&p.payload, "fingerprint")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RecordMetadata;

    #[test]
    fn distance_round_trips_through_wire_enum() {
        for d in [DistanceKind::Cosine, DistanceKind::Dot, DistanceKind::Euclid] {
            assert_eq!(from_qdrant(to_qdrant(d) as i32), Some(d));
        }
        assert_eq!(from_qdrant(0), None);
    }

    #[test]
    fn point_payload_carries_text_and_metadata() {
        let record = IndexRecord {
            id: uuid::Uuid::from_bytes([7; 16]),
            vector: vec![0.5, 0.5],
            text: r#"{"flight":"AI 101"}"#.into(),
            metadata: RecordMetadata {
                chunk_index: 3,
                source: "Journey_Details.json".into(),
                fingerprint: "abc".into(),
            },
        };
        let point = to_point(&record).unwrap();
        assert_eq!(string_field(&point.payload, "text").as_deref(), Some(r#"{"flight":"AI 101"}"#));
        assert_eq!(string_field(&point.payload, "fingerprint").as_deref(), Some("abc"));
    }

    #[test]
    fn client_builds_without_network() {
        let cfg = RagConfig::new_default("http://localhost:6334", "travel-journey");
        let idx = QdrantIndex::new(&cfg).unwrap();
        assert_eq!(idx.backend(), "qdrant");
    }
}
