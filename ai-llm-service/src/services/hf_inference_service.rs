//! Hugging Face Inference API client for text generation.
//!
//! - `POST {endpoint}/models/{model}` with `Authorization: Bearer <HF_TOKEN>`
//!
//! The request carries the prompt as `inputs` and generation parameters
//! (`max_new_tokens`, `temperature`, `top_p`, `return_full_text = false`), so
//! only the continuation comes back.
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::config::llm_model_config::LlmModelConfig;
//! use ai_llm_service::config::llm_provider::LlmProvider;
//! use ai_llm_service::retry::RetryPolicy;
//! use ai_llm_service::services::hf_inference_service::HfInferenceService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = HfInferenceService::new(LlmModelConfig {
//!     provider: LlmProvider::HuggingFace,
//!     model: "mistralai/Mixtral-8x7B-Instruct-v0.1".into(),
//!     endpoint: "https://api-inference.huggingface.co".into(),
//!     api_key: Some("hf_...".into()),
//!     max_tokens: Some(1000),
//!     temperature: None,
//!     top_p: None,
//!     timeout_secs: Some(60),
//!     retry: RetryPolicy::default(),
//! })?;
//! let answer = svc.generate("When does my flight leave?").await?;
//! println!("{answer}");
//! # Ok(()) }
//! ```

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ProviderError, ProviderErrorKind, Result};
use crate::services::{bearer, build_client, decode, ensure_success, transport};

/// Thin client for the hosted inference endpoint.
pub struct HfInferenceService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    auth: header::HeaderValue,
    timeout: Duration,
}

impl HfInferenceService {
    /// Creates a client from a validated Hugging Face profile.
    ///
    /// # Errors
    /// - `ProviderErrorKind::InvalidProvider` if `cfg.provider` is not Hugging Face
    /// - config errors from [`LlmModelConfig::validate`]
    /// - `AiLlmError::HttpTransport` if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let (client, timeout) = build_client(&cfg, LlmProvider::HuggingFace)?;
        let auth = bearer(&cfg)?;
        let url_generate = format!("{}/models/{}", cfg.base_url(), cfg.model.trim());
        Ok(Self {
            client,
            cfg,
            url_generate,
            auth,
            timeout,
        })
    }

    /// Generates a continuation for `prompt`, retrying transient failures.
    ///
    /// # Errors
    /// - `ProviderErrorKind::HttpStatus` for non-2xx responses
    /// - `ProviderErrorKind::Decode` / `EmptyResponse` for unusable payloads
    /// - `AiLlmError::Timeout` / `HttpTransport` for transport failures
    #[instrument(skip_all, fields(model = %self.cfg.model, prompt_chars = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.cfg
            .retry
            .run("hf.generate", || self.generate_once(prompt))
            .await
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt);

        debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .header(header::AUTHORIZATION, self.auth.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(e, self.timeout))?;

        let resp = ensure_success(LlmProvider::HuggingFace, &self.url_generate, resp).await?;
        let out: GenerateResponse = decode(
            LlmProvider::HuggingFace,
            resp,
            "`[{ generated_text: string }]`",
        )
        .await?;
        out.into_text()
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_new_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    return_full_text: bool,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str) -> Self {
        Self {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: cfg.max_tokens,
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                return_full_text: false,
            },
        }
    }
}

/// The API answers with a list for batched inputs and an object otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Many(Vec<Generated>),
    One(Generated),
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String> {
        let text = match self {
            GenerateResponse::Many(items) => items.into_iter().next().map(|g| g.generated_text),
            GenerateResponse::One(g) => Some(g.generated_text),
        };
        match text {
            Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
            _ => Err(ProviderError::new(LlmProvider::HuggingFace, ProviderErrorKind::EmptyResponse).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::AiLlmError;
    use crate::retry::RetryPolicy;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::HuggingFace,
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".into(),
            endpoint: "https://api-inference.huggingface.co/".into(),
            api_key: Some("hf_token".into()),
            max_tokens: Some(1000),
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
            retry: RetryPolicy::none(),
        }
    }

    #[test]
    fn request_shape() {
        let c = cfg();
        let body = serde_json::to_value(GenerateRequest::from_cfg(&c, "hi")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "inputs": "hi",
                "parameters": { "max_new_tokens": 1000, "return_full_text": false }
            })
        );
    }

    #[test]
    fn url_is_built_from_model() {
        let svc = HfInferenceService::new(cfg()).unwrap();
        assert_eq!(
            svc.url_generate,
            "https://api-inference.huggingface.co/models/mistralai/Mixtral-8x7B-Instruct-v0.1"
        );
    }

    #[test]
    fn rejects_other_providers() {
        let err = HfInferenceService::new(LlmModelConfig {
            provider: LlmProvider::Jina,
            ..cfg()
        })
        .err()
        .unwrap();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError { kind: ProviderErrorKind::InvalidProvider, .. })
        ));
    }

    #[test]
    fn decodes_list_and_object_forms() {
        let list: GenerateResponse =
            serde_json::from_str(r#"[{"generated_text":" Your flight is AI 101. "}]"#).unwrap();
        assert_eq!(list.into_text().unwrap(), "Your flight is AI 101.");
        let one: GenerateResponse = serde_json::from_str(r#"{"generated_text":"ok"}"#).unwrap();
        assert_eq!(one.into_text().unwrap(), "ok");
        let empty: GenerateResponse = serde_json::from_str("[]").unwrap();
        assert!(empty.into_text().is_err());
    }
}
