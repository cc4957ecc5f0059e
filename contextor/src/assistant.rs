//! The travel assistant service object: provisioned once, shared behind `Arc`
//! by the CLI and the HTTP handlers.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use rag_store::{
    EmbeddingsProvider, IndexProvisioner, LlmServiceEmbedder, NoopProgress, Progress, VectorIndex,
    open_index,
};
use tracing::{info, instrument, warn};

use crate::api_types::{QaAnswer, RetrievalOutcome};
use crate::cfg::ContextorConfig;
use crate::error::ContextorError;
use crate::llm::TextGenerator;
use crate::retrieve::Retriever;

/// Reply to a bare greeting.
pub const GREETING_REPLY: &str =
    "Hello! I'm your travel assistant. How can I help you with your travel plans today?";

const GREETINGS: [&str; 6] = [
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Whether `input` is just a greeting (case-insensitive, surrounding whitespace ignored).
pub fn is_greeting(input: &str) -> bool {
    let q = input.trim().to_lowercase();
    GREETINGS.contains(&q.as_str())
}

/// Retrieval-augmented question answering over the travel data.
pub struct TravelAssistant {
    retriever: Retriever,
    generator: Arc<dyn TextGenerator>,
    top_k: usize,
    score_threshold: f32,
}

impl TravelAssistant {
    /// Provisions the index and wires the collaborators.
    ///
    /// # Errors
    /// Any provisioning or configuration error; these are fatal to startup.
    pub async fn new(
        cfg: ContextorConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
        generator: Arc<dyn TextGenerator>,
        progress: Arc<dyn Progress>,
    ) -> Result<Self, ContextorError> {
        cfg.validate()?;
        let template = cfg.load_template()?;
        let handle = IndexProvisioner::new(cfg.rag.clone(), index, embedder.clone())
            .with_progress(progress)
            .ensure_ready()
            .await?;
        info!(index = handle.name(), dimension = handle.dimension(), "travel assistant ready");
        Ok(Self {
            retriever: Retriever::new(handle, embedder, template),
            generator,
            top_k: cfg.top_k,
            score_threshold: cfg.score_threshold,
        })
    }

    /// Production wiring: configured index backend, embeddings and generation
    /// through the shared LLM service.
    pub async fn from_service(
        cfg: ContextorConfig,
        svc: Arc<LlmServiceProfiles>,
        progress: Option<Arc<dyn Progress>>,
    ) -> Result<Self, ContextorError> {
        let index = open_index(&cfg.rag)?;
        let embedder = Arc::new(LlmServiceEmbedder::new(svc.clone(), cfg.rag.dimension));
        let progress = progress.unwrap_or_else(|| Arc::new(NoopProgress) as Arc<dyn Progress>);
        Self::new(cfg, index, embedder, svc, progress).await
    }

    /// Retrieval with the configured `k` and threshold.
    pub async fn get_answer(&self, query: &str) -> Result<RetrievalOutcome, ContextorError> {
        self.retrieve(query, None, None).await
    }

    /// Retrieval only; `None` falls back to the configured defaults.
    pub async fn retrieve(
        &self,
        query: &str,
        k: Option<usize>,
        score_threshold: Option<f32>,
    ) -> Result<RetrievalOutcome, ContextorError> {
        Ok(self
            .retriever
            .retrieve(
                query,
                k.unwrap_or(self.top_k),
                score_threshold.unwrap_or(self.score_threshold),
            )
            .await?)
    }

    /// Answers `question`; greetings are answered without retrieval or generation.
    ///
    /// # Errors
    /// Retrieval errors as [`ContextorError::Rag`], generation errors as
    /// [`ContextorError::Llm`]. A failed retrieval is never turned into an answer.
    #[instrument(skip_all, fields(chars = question.len()))]
    pub async fn ask(
        &self,
        question: &str,
        k: Option<usize>,
        score_threshold: Option<f32>,
    ) -> Result<QaAnswer, ContextorError> {
        if is_greeting(question) {
            return Ok(QaAnswer::canned(GREETING_REPLY));
        }
        let outcome = self.retrieve(question, k, score_threshold).await?;
        let answer = self.generator.generate(&outcome.prompt).await.inspect_err(|e| {
            warn!(error = %e, "generation failed");
        })?;
        Ok(QaAnswer::from_outcome(answer, outcome))
    }
}
