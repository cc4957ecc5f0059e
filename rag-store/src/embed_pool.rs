//! Embedding executor with bounded concurrency and dimension checks.

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::progress::Progress;

/// Embeds `texts` in batches of `batch_size`, at most `concurrency` batches in flight.
///
/// Output order matches input order. Every vector must have `expected_dim`
/// components.
///
/// # Errors
/// The first provider failure, or [`RagError::VectorSizeMismatch`].
pub async fn embed_all(
    texts: &[String],
    provider: &dyn EmbeddingsProvider,
    expected_dim: usize,
    batch_size: usize,
    concurrency: usize,
    progress: &dyn Progress,
) -> Result<Vec<Vec<f32>>, RagError> {
    info!(
        total = texts.len(),
        batch_size,
        concurrency,
        "embedding chunks"
    );
    if texts.is_empty() {
        debug!("nothing to embed");
        return Ok(Vec::new());
    }

    progress.set_total(texts.len() as u64);
    progress.message("embedding");

    let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(batch_size.max(1)))
        .map(|batch| async move {
            let vectors = provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(RagError::Embedding(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }
            if let Some(v) = vectors.iter().find(|v| v.len() != expected_dim) {
                return Err(RagError::VectorSizeMismatch {
                    got: v.len(),
                    want: expected_dim,
                });
            }
            progress.inc(batch.len() as u64);
            Ok(vectors)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    debug!(batches = batches.len(), "embeddings computed");
    Ok(batches.into_iter().flatten().collect())
}
