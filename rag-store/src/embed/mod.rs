use crate::errors::RagFuture;

/// Provider interface for embedding generation.
///
/// Async is required because real providers (Jina, Ollama) perform HTTP
/// requests. Same text must map to the same vector, and every vector has
/// length [`dimension`](Self::dimension).
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds one text.
    fn embed<'a>(&'a self, text: &'a str) -> RagFuture<'a, Vec<f32>>;

    /// Embeds several texts; output order matches `texts`.
    ///
    /// The default calls [`embed`](Self::embed) sequentially.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> RagFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed(t).await?);
            }
            Ok(out)
        })
    }

    /// Fixed vector length.
    fn dimension(&self) -> usize;

    /// Identifier of the model, part of the source fingerprint.
    fn model_id(&self) -> &str;
}

pub mod llm_service;
