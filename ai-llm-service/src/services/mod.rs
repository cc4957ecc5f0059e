//! Provider clients.
//!
//! Each client owns a `reqwest::Client` built from its [`LlmModelConfig`] and
//! wraps every request in the profile's [`RetryPolicy`](crate::retry::RetryPolicy).

pub mod hf_inference_service;
pub mod jina_service;
pub mod ollama_service;

use std::time::Duration;

use reqwest::{Response, header};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{
    AiLlmError, HttpError, ProviderError, ProviderErrorKind, Result, make_snippet,
};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Checks the provider, validates the profile and builds an HTTP client.
pub(crate) fn build_client(
    cfg: &LlmModelConfig,
    expected: LlmProvider,
) -> Result<(reqwest::Client, Duration)> {
    if cfg.provider != expected {
        return Err(ProviderError::new(expected, ProviderErrorKind::InvalidProvider).into());
    }
    cfg.validate()?;

    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok((client, timeout))
}

/// `Authorization: Bearer …` header for hosted providers.
pub(crate) fn bearer(cfg: &LlmModelConfig) -> Result<header::HeaderValue> {
    let key = cfg
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ProviderError::new(cfg.provider, ProviderErrorKind::MissingApiKey))?;
    header::HeaderValue::from_str(&format!("Bearer {}", key.trim())).map_err(|e| {
        ProviderError::new(cfg.provider, ProviderErrorKind::Decode(format!("invalid API key header: {e}")))
            .into()
    })
}

/// Maps a transport failure, turning client timeouts into [`AiLlmError::Timeout`].
pub(crate) fn transport(err: reqwest::Error, timeout: Duration) -> AiLlmError {
    if err.is_timeout() {
        AiLlmError::Timeout(timeout)
    } else {
        AiLlmError::HttpTransport(err)
    }
}

/// Returns the response unchanged when 2xx, otherwise a provider HTTP error.
pub(crate) async fn ensure_success(
    provider: LlmProvider,
    url: &str,
    resp: Response,
) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let err = HttpError {
        status,
        url: url.to_string(),
        snippet: make_snippet(&text),
    };
    tracing::error!(?provider, %url, %status, snippet = %err.snippet, "provider returned non-success status");
    Err(ProviderError::new(provider, ProviderErrorKind::HttpStatus(err)).into())
}

/// Decodes a JSON body, reporting the expected shape on failure.
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(
    provider: LlmProvider,
    resp: Response,
    expected: &'static str,
) -> Result<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ProviderError::new(
            provider,
            ProviderErrorKind::Decode(format!("serde error: {e}; expected {expected}")),
        )
        .into()
    })
}
