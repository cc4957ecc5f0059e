//! Retrieval: relevance search plus prompt assembly, no generation.

use std::sync::Arc;

use rag_store::{
    EmbeddingsProvider, RagError, RelevanceQuery, VectorStoreHandle, search_relevant,
};
use tracing::{debug, info};

use crate::api_types::RetrievalOutcome;
use crate::prompt::{NO_CONTEXT_FALLBACK, PromptTemplate};

/// Embeds a query, keeps the relevant chunks and renders the prompt.
pub struct Retriever {
    handle: VectorStoreHandle,
    embedder: Arc<dyn EmbeddingsProvider>,
    template: PromptTemplate,
}

impl Retriever {
    pub fn new(
        handle: VectorStoreHandle,
        embedder: Arc<dyn EmbeddingsProvider>,
        template: PromptTemplate,
    ) -> Self {
        Self {
            handle,
            embedder,
            template,
        }
    }

    pub fn handle(&self) -> &VectorStoreHandle {
        &self.handle
    }

    /// Up to `k` chunks scoring at least `score_threshold`, joined into the prompt.
    ///
    /// No relevant chunk is a normal outcome: the prompt then carries
    /// [`NO_CONTEXT_FALLBACK`].
    ///
    /// # Errors
    /// - [`RagError::InvalidQuery`] for `k == 0` or a threshold outside `[-1, 1]`
    /// - [`RagError::Embedding`] / [`RagError::Index`] when a backend fails
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        score_threshold: f32,
    ) -> Result<RetrievalOutcome, RagError> {
        let q = RelevanceQuery::new(query)
            .with_k(k)
            .with_threshold(score_threshold);
        let hits = search_relevant(&self.handle, self.embedder.as_ref(), q).await?;

        if hits.is_empty() {
            info!(k, score_threshold, "no relevant documents");
            return Ok(RetrievalOutcome {
                context: String::new(),
                similar_docs: Vec::new(),
                prompt: self.template.render(NO_CONTEXT_FALLBACK, query),
            });
        }

        debug!(
            kept = hits.len(),
            best = hits[0].score,
            "relevant documents found"
        );
        let similar_docs: Vec<String> = hits.into_iter().map(|h| h.text).collect();
        let context = similar_docs.join("\n");
        let prompt = self.template.render(&context, query);
        Ok(RetrievalOutcome {
            context,
            similar_docs,
            prompt,
        })
    }
}
