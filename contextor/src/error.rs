//! Typed error for the contextor crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Text generation failed.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Invalid assistant settings.
    #[error("config error: {0}")]
    Config(String),
}

impl ContextorError {
    /// Failures of a remote collaborator that may succeed later.
    pub fn is_transient(&self) -> bool {
        match self {
            ContextorError::Rag(e) => e.is_transient(),
            ContextorError::Llm(e) => !llm_misconfigured(e),
            ContextorError::Config(_) => false,
        }
    }

    /// Failures that only a configuration change can fix: bad settings,
    /// a model/index mismatch or rejected credentials.
    pub fn is_config(&self) -> bool {
        match self {
            ContextorError::Rag(e) => e.is_config(),
            ContextorError::Llm(e) => llm_misconfigured(e),
            ContextorError::Config(_) => true,
        }
    }

    /// Caller-supplied query parameters were rejected.
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, ContextorError::Rag(rag_store::RagError::InvalidQuery(_)))
    }
}

fn llm_misconfigured(e: &ai_llm_service::AiLlmError) -> bool {
    matches!(e, ai_llm_service::AiLlmError::Config(_)) || e.is_auth_failure()
}
