use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32};
use crate::retry::RetryPolicy;

/// Configuration for one model profile (generation or embedding).
///
/// # Fields
///
/// - `provider`: backend serving the model.
/// - `model`: model identifier (e.g. `"mistralai/Mixtral-8x7B-Instruct-v0.1"`,
///   `"jina-embeddings-v2-base-en"`).
/// - `endpoint`: base URL of the API.
/// - `api_key`: bearer credential for hosted providers.
/// - `max_tokens`: generation budget (`max_new_tokens` / `num_predict`).
/// - `temperature`, `top_p`: sampling knobs, passed through when set.
/// - `timeout_secs`: per-request timeout.
/// - `retry`: retry budget for transient transport failures.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
/// use ai_llm_service::config::llm_provider::LlmProvider;
/// use ai_llm_service::retry::RetryPolicy;
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::HuggingFace,
///     model: "mistralai/Mixtral-8x7B-Instruct-v0.1".to_string(),
///     endpoint: "https://api-inference.huggingface.co".to_string(),
///     api_key: Some("hf_...".to_string()),
///     max_tokens: Some(1000),
///     temperature: None,
///     top_p: None,
///     timeout_secs: Some(60),
///     retry: RetryPolicy::default(),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Backend serving this profile.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Base URL (no trailing path).
    pub endpoint: String,

    /// Optional API key (required by Hugging Face and Jina).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// Retry budget for transient failures.
    pub retry: RetryPolicy,
}

impl LlmModelConfig {
    /// Validates static invariants of the profile.
    ///
    /// # Errors
    /// Returns a config error for an empty model, a non-http endpoint,
    /// out-of-range sampling values, or a hosted provider without API key.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", &self.endpoint)?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        let needs_key = matches!(self.provider, LlmProvider::HuggingFace | LlmProvider::Jina);
        if needs_key && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            return Err(ConfigError::MissingApiKey(self.provider).into());
        }
        Ok(())
    }

    /// Base endpoint without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.endpoint.trim().trim_end_matches('/')
    }
}
