use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Backend used for inference or embeddings.
///
/// Text generation is served by [`LlmProvider::HuggingFace`] or
/// [`LlmProvider::Ollama`]; embeddings by [`LlmProvider::Jina`] or
/// [`LlmProvider::Ollama`].
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "hf".parse().unwrap();
/// assert_eq!(p, LlmProvider::HuggingFace);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local or self-hosted Ollama runtime.
    Ollama,
    /// Hugging Face Inference API (text generation).
    HuggingFace,
    /// Jina AI embeddings API.
    Jina,
}

impl LlmProvider {
    /// Whether this provider can serve `generate` calls.
    pub fn supports_generation(self) -> bool {
        matches!(self, LlmProvider::Ollama | LlmProvider::HuggingFace)
    }

    /// Whether this provider can serve `embed` calls.
    pub fn supports_embeddings(self) -> bool {
        matches!(self, LlmProvider::Ollama | LlmProvider::Jina)
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "huggingface" | "hugging_face" | "hf" => Ok(LlmProvider::HuggingFace),
            "jina" => Ok(LlmProvider::Jina),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
