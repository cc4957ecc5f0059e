//! Embedding provider backed by the shared [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use tracing::warn;

use crate::embed::EmbeddingsProvider;
use crate::errors::{RagError, RagFuture};

/// Uses the embedding profile (Jina or Ollama) of the shared service.
#[derive(Clone)]
pub struct LlmServiceEmbedder {
    svc: Arc<LlmServiceProfiles>,
    dim: usize,
    model: String,
}

impl LlmServiceEmbedder {
    /// `dim` is the vector length the model is known to produce.
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: usize) -> Self {
        let model = svc.profiles().1.model.clone();
        Self { svc, dim, model }
    }

    fn check(&self, v: &[f32]) -> Result<(), RagError> {
        if v.len() != self.dim {
            warn!(got = v.len(), want = self.dim, model = %self.model, "embedding dimension mismatch");
            return Err(RagError::VectorSizeMismatch {
                got: v.len(),
                want: self.dim,
            });
        }
        Ok(())
    }
}

impl EmbeddingsProvider for LlmServiceEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> RagFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await?;
            self.check(&v)?;
            Ok(v)
        })
    }

    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> RagFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let out = self.svc.embed_batch(texts).await?;
            if out.len() != texts.len() {
                return Err(RagError::Embedding(format!(
                    "expected {} vectors, got {}",
                    texts.len(),
                    out.len()
                )));
            }
            for v in &out {
                self.check(v)?;
            }
            Ok(out)
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
