//! [`RagError`] and the boxed future type shared by the async seams.

use std::{future::Future, pin::Pin};

use thiserror::Error;

/// Boxed future returned by the async provider and index traits.
pub type RagFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Everything chunking, embedding, provisioning or searching can fail with.
#[derive(Debug, Error)]
pub enum RagError {
    /// Reading the source document.
    #[error("cannot read source: {0}")]
    Io(#[from] std::io::Error),

    /// Source document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("bad configuration: {0}")]
    Config(String),

    /// Provider or index dimension differs from the configured one.
    #[error("expected {want}-dimensional vectors, got {got}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// A single value cannot be placed in any chunk without truncation.
    #[error("value at {path} needs {size} chars but the chunk ceiling is {max}")]
    OversizedLeaf { path: String, size: usize, max: usize },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("{backend} index failed: {message}")]
    Index {
        backend: &'static str,
        message: String,
    },

    /// The index was created but not fully populated.
    #[error(
        "index '{index}' partially provisioned: {inserted}/{expected} records inserted ({reason})"
    )]
    ProvisioningPartial {
        index: String,
        inserted: usize,
        expected: usize,
        reason: String,
    },

    /// `k` or the score threshold is out of range.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl RagError {
    /// Retrieval failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, RagError::Embedding(_) | RagError::Index { .. })
    }

    /// Errors caused by configuration rather than by a remote service.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            RagError::Config(_) | RagError::VectorSizeMismatch { .. } | RagError::OversizedLeaf { .. }
        )
    }

    pub(crate) fn index(backend: &'static str, err: impl std::fmt::Display) -> Self {
        RagError::Index {
            backend,
            message: err.to_string(),
        }
    }
}

impl From<ai_llm_service::AiLlmError> for RagError {
    fn from(err: ai_llm_service::AiLlmError) -> Self {
        match err {
            ai_llm_service::AiLlmError::Config(c) => RagError::Config(c.to_string()),
            e if e.is_auth_failure() => {
                RagError::Config(format!("embedding provider rejected the credentials: {e}"))
            }
            other => RagError::Embedding(other.to_string()),
        }
    }
}
