//! Client for a local Ollama server.
//!
//! Generation goes to `/api/generate` with `stream: false`, embeddings to
//! `/api/embed`, which accepts a list of inputs and answers in the same order.
//!
//! ```no_run
//! use ai_llm_service::config::llm_model_config::LlmModelConfig;
//! use ai_llm_service::config::llm_provider::LlmProvider;
//! use ai_llm_service::retry::RetryPolicy;
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ollama = OllamaService::new(LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "mistral".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(30),
//!     retry: RetryPolicy::default(),
//! })?;
//!
//! let reply = ollama.generate("When does my train leave Florence?").await?;
//! let vectors = ollama.embeddings_batch(&["Lisbon".into(), "Porto".into()]).await?;
//! println!("{reply} ({} vectors)", vectors.len());
//! # Ok(()) }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ProviderError, ProviderErrorKind, Result};
use crate::services::{build_client, decode, ensure_success, transport};

pub struct OllamaService {
    http: reqwest::Client,
    cfg: LlmModelConfig,
    generate_url: String,
    embed_url: String,
    timeout: Duration,
}

impl OllamaService {
    /// Fails when `cfg` is not an Ollama profile or does not validate.
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let (http, timeout) = build_client(&cfg, LlmProvider::Ollama)?;
        let generate_url = format!("{}/api/generate", cfg.base_url());
        let embed_url = format!("{}/api/embed", cfg.base_url());
        Ok(Self {
            http,
            cfg,
            generate_url,
            embed_url,
            timeout,
        })
    }

    /// Single completion; `max_tokens` is sent as `num_predict`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        self.cfg
            .retry
            .run("ollama.generate", move || async move {
                let req = Completion::new(&self.cfg, prompt);
                let out: CompletionReply = self
                    .post(&self.generate_url, &req, "`{ response: string }` with stream=false")
                    .await?;
                if out.response.trim().is_empty() {
                    return Err(empty());
                }
                Ok::<_, AiLlmError>(out.response)
            })
            .await
    }

    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embeddings_batch(&[input.to_owned()]).await?;
        vectors.pop().ok_or_else(empty)
    }

    /// One vector per input, same order.
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embeddings_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }
        self.cfg
            .retry
            .run("ollama.embed", move || async move {
                let req = EmbedBatch {
                    model: &self.cfg.model,
                    input: inputs,
                };
                let out: EmbedReply = self
                    .post(&self.embed_url, &req, "`{ embeddings: number[][] }`")
                    .await?;
                if out.embeddings.len() != inputs.len() {
                    let msg = format!("{} inputs but {} vectors", inputs.len(), out.embeddings.len());
                    return Err(ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::Decode(msg)).into());
                }
                Ok::<_, AiLlmError>(out.embeddings)
            })
            .await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        shape: &'static str,
    ) -> Result<T> {
        debug!(%url, "ollama request");
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(e, self.timeout))?;
        let resp = ensure_success(LlmProvider::Ollama, url, resp).await?;
        decode(LlmProvider::Ollama, resp, shape).await
    }
}

fn empty() -> AiLlmError {
    ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::EmptyResponse).into()
}

#[derive(Serialize)]
struct Completion<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: Sampling,
}

impl<'a> Completion<'a> {
    fn new(cfg: &'a LlmModelConfig, prompt: &'a str) -> Self {
        Completion {
            model: &cfg.model,
            prompt,
            stream: false,
            options: Sampling {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                num_predict: cfg.max_tokens,
            },
        }
    }
}

#[derive(Serialize)]
struct Sampling {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionReply {
    response: String,
}

#[derive(Serialize)]
struct EmbedBatch<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedReply {
    embeddings: Vec<Vec<f32>>,
}
