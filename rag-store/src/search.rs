//! Relevance search: embed a query, fetch the top-k neighbours, keep those
//! scoring at or above a threshold.

use tracing::{debug, trace};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::index::{SearchResult, VectorStoreHandle};

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.7;

/// Parameters of a relevance search.
#[derive(Clone, Copy, Debug)]
pub struct RelevanceQuery<'a> {
    pub text: &'a str,
    pub k: usize,
    /// Inclusive lower bound on the similarity score.
    pub score_threshold: f32,
}

impl<'a> RelevanceQuery<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            k: DEFAULT_TOP_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    /// # Errors
    /// [`RagError::InvalidQuery`] for `k == 0` or a threshold outside `[-1, 1]`.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.k == 0 {
            return Err(RagError::InvalidQuery("k must be at least 1".into()));
        }
        if !self.score_threshold.is_finite() || !(-1.0..=1.0).contains(&self.score_threshold) {
            return Err(RagError::InvalidQuery(format!(
                "score_threshold must be within [-1, 1], got {}",
                self.score_threshold
            )));
        }
        Ok(())
    }
}

/// Runs `query` against `handle`, best hit first.
///
/// An empty result is not an error.
///
/// # Errors
/// - [`RagError::InvalidQuery`] for out-of-range parameters
/// - [`RagError::Embedding`] / [`RagError::Index`] when a backend fails
pub async fn search_relevant(
    handle: &VectorStoreHandle,
    provider: &dyn EmbeddingsProvider,
    query: RelevanceQuery<'_>,
) -> Result<Vec<SearchResult>, RagError> {
    query.validate()?;
    trace!(k = query.k, threshold = query.score_threshold, "relevance search");

    let vector = provider.embed(query.text).await?;
    let mut hits = handle.search(&vector, query.k).await?;
    let candidates = hits.len();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(query.k);
    hits.retain(|h| h.score >= query.score_threshold);

    debug!(candidates, kept = hits.len(), index = handle.name(), "relevance search done");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::errors::RagFuture;
    use crate::index::{CreateOutcome, IndexInfo, IndexRecord, IndexSpec, VectorIndex};

    /// Backend answering every search with the same hits, in the given order.
    struct CannedHits(Vec<(&'static str, f32)>);

    impl VectorIndex for CannedHits {
        fn backend(&self) -> &'static str {
            "canned"
        }

        fn list_indexes(&self) -> RagFuture<'_, Vec<String>> {
            Box::pin(async { Ok(vec!["trips".to_string()]) })
        }

        fn create_index<'a>(&'a self, _spec: &'a IndexSpec) -> RagFuture<'a, CreateOutcome> {
            Box::pin(async { Ok(CreateOutcome::AlreadyExists) })
        }

        fn describe_index<'a>(&'a self, _name: &'a str) -> RagFuture<'a, IndexInfo> {
            Box::pin(async { Err(RagError::Config("not supported".into())) })
        }

        fn delete_index<'a>(&'a self, _name: &'a str) -> RagFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }

        fn upsert<'a>(&'a self, _name: &'a str, records: &'a [IndexRecord]) -> RagFuture<'a, usize> {
            Box::pin(async move { Ok(records.len()) })
        }

        fn search<'a>(
            &'a self,
            _name: &'a str,
            _vector: &'a [f32],
            k: usize,
        ) -> RagFuture<'a, Vec<SearchResult>> {
            Box::pin(async move {
                Ok(self
                    .0
                    .iter()
                    .take(k)
                    .map(|(text, score)| SearchResult {
                        text: (*text).to_string(),
                        score: *score,
                    })
                    .collect())
            })
        }

        fn fingerprint<'a>(&'a self, _name: &'a str) -> RagFuture<'a, Option<String>> {
            Box::pin(async { Ok(None) })
        }
    }

    struct UnitEmbedder;

    impl EmbeddingsProvider for UnitEmbedder {
        fn embed<'a>(&'a self, _text: &'a str) -> RagFuture<'a, Vec<f32>> {
            Box::pin(async { Ok(vec![1.0, 0.0]) })
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_id(&self) -> &str {
            "unit"
        }
    }

    #[tokio::test]
    async fn keeps_hits_at_threshold_in_descending_order() {
        let index = CannedHits(vec![("hotel", 0.7), ("flight", 0.9), ("visa", 0.69)]);
        let handle = VectorStoreHandle::new(Arc::new(index), "trips", 2);

        let hits = search_relevant(&handle, &UnitEmbedder, RelevanceQuery::new("when do I fly?"))
            .await
            .unwrap();

        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, ["flight", "hotel"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(hits.iter().all(|h| h.score >= DEFAULT_SCORE_THRESHOLD));
    }

    #[tokio::test]
    async fn nothing_above_threshold_is_an_empty_result() {
        let handle = VectorStoreHandle::new(Arc::new(CannedHits(vec![("visa", 0.4)])), "trips", 2);
        let hits = search_relevant(&handle, &UnitEmbedder, RelevanceQuery::new("q"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn rejects_zero_k() {
        let err = RelevanceQuery::new("q").with_k(0).validate().unwrap_err();
        assert!(matches!(err, RagError::InvalidQuery(_)));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        for t in [1.5, -1.01, f32::NAN, f32::INFINITY] {
            let err = RelevanceQuery::new("q").with_threshold(t).validate().unwrap_err();
            assert!(matches!(err, RagError::InvalidQuery(_)), "threshold {t}");
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(RelevanceQuery::new("q").with_threshold(1.0).validate().is_ok());
        assert!(RelevanceQuery::new("q").with_threshold(-1.0).validate().is_ok());
    }
}
