//! Jina AI embeddings client.
//!
//! - `POST {endpoint}/v1/embeddings` with `{ model, input: [..] }`
//!
//! The API may return items out of order; they are re-sorted by `index` so the
//! output vector lines up with the input slice.

use std::time::Duration;

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ProviderError, ProviderErrorKind, Result};
use crate::services::{bearer, build_client, decode, ensure_success, transport};

/// Thin client for Jina embeddings.
pub struct JinaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_embeddings: String,
    auth: header::HeaderValue,
    timeout: Duration,
}

impl JinaService {
    /// Creates a client from a validated Jina profile.
    ///
    /// # Errors
    /// - `ProviderErrorKind::InvalidProvider` if `cfg.provider` is not Jina
    /// - config errors from [`LlmModelConfig::validate`]
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let (client, timeout) = build_client(&cfg, LlmProvider::Jina)?;
        let auth = bearer(&cfg)?;
        let url_embeddings = format!("{}/v1/embeddings", cfg.base_url());
        Ok(Self {
            client,
            cfg,
            url_embeddings,
            auth,
            timeout,
        })
    }

    /// Embeds a single text.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let mut out = self.embeddings_batch(&[input.to_string()]).await?;
        out.pop()
            .ok_or_else(|| ProviderError::new(LlmProvider::Jina, ProviderErrorKind::EmptyResponse).into())
    }

    /// Embeds many texts in one request; output order matches `inputs`.
    ///
    /// # Errors
    /// `ProviderErrorKind::Decode` if the number of vectors differs from the
    /// number of inputs.
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embeddings_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.cfg
            .retry
            .run("jina.embed", || self.embed_once(inputs))
            .await
    }

    async fn embed_once(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input: inputs,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .header(header::AUTHORIZATION, self.auth.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(e, self.timeout))?;

        let resp = ensure_success(LlmProvider::Jina, &self.url_embeddings, resp).await?;
        let out: EmbeddingsResponse = decode(
            LlmProvider::Jina,
            resp,
            "`{ data: [{ index, embedding: number[] }] }`",
        )
        .await?;
        out.into_ordered(inputs.len())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl EmbeddingsResponse {
    fn into_ordered(mut self, expected: usize) -> Result<Vec<Vec<f32>>> {
        if self.data.len() != expected {
            return Err(ProviderError::new(
                LlmProvider::Jina,
                ProviderErrorKind::Decode(format!(
                    "expected {expected} embeddings, got {}",
                    self.data.len()
                )),
            )
            .into());
        }
        self.data.sort_by_key(|item| item.index);
        Ok(self.data.into_iter().map(|item| item.embedding).collect())
    }
}
