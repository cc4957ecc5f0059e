//! Text generation seam: prompt in, answer out.

use std::future::Future;
use std::pin::Pin;

use ai_llm_service::LlmServiceProfiles;
use tracing::debug;

use crate::error::ContextorError;

pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ContextorError>> + Send + 'a>>;

/// Anything that can turn a grounding prompt into an answer.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
}

/// Uses the `generation` profile (Hugging Face or Ollama).
impl TextGenerator for LlmServiceProfiles {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            debug!(model = %self.profiles().0.model, prompt_chars = prompt.len(), "generating answer");
            Ok(LlmServiceProfiles::generate(self, prompt).await?)
        })
    }
}
