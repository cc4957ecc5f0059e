//! Default model profiles loaded from environment variables.
//!
//! Two roles are configured:
//!
//! - **Generation** → answers questions from an assembled prompt
//! - **Embedding**  → turns chunks and queries into vectors
//!
//! # Environment variables
//!
//! Generation:
//! - `LLM_KIND` = `huggingface` (default) or `ollama`
//! - `HF_TOKEN` = Hugging Face API token (required for `huggingface`)
//! - `HF_MODEL` = model id, default `mistralai/Mixtral-8x7B-Instruct-v0.1`
//! - `HF_INFERENCE_URL` = default `https://api-inference.huggingface.co`
//! - `LLM_MAX_TOKENS` = default `1000`
//! - `LLM_TEMPERATURE`, `LLM_TOP_P` = optional sampling knobs
//!
//! Embedding:
//! - `EMBEDDING_KIND` = `jina` (default) or `ollama`
//! - `JINA_API_KEY` = Jina token (required for `jina`)
//! - `EMBEDDING_MODEL` = default `jina-embeddings-v2-base-en`
//! - `JINA_URL` = default `https://api.jina.ai`
//!
//! Shared:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = Ollama endpoint (required for `ollama`)
//! - `OLLAMA_MODEL` = Ollama generation model (required for `ollama` generation)
//! - `LLM_TIMEOUT_SECS` = per-request timeout, default `60`
//! - `LLM_MAX_RETRIES` = retry budget for transient failures, default `2`

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, env_opt, parse_opt},
    retry::RetryPolicy,
};

pub const DEFAULT_HF_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";
pub const DEFAULT_HF_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 1000;
pub const DEFAULT_EMBEDDING_MODEL: &str = "jina-embeddings-v2-base-en";
pub const DEFAULT_JINA_URL: &str = "https://api.jina.ai";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Builds the generation profile from the process environment.
///
/// # Errors
/// Returns [`ConfigError`] variants for missing or malformed variables and
/// for providers that cannot generate text.
pub fn config_generation() -> Result<LlmModelConfig, AiLlmError> {
    generation_from(&env_opt)
}

/// Builds the embedding profile from the process environment.
///
/// # Errors
/// Returns [`ConfigError`] variants for missing or malformed variables and
/// for providers that cannot embed text.
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    embedding_from(&env_opt)
}

type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn generation_from(get: Lookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from(get, "LLM_KIND", LlmProvider::HuggingFace)?;
    if !provider.supports_generation() {
        return Err(ConfigError::UnsupportedRole {
            provider,
            role: "generation",
        }
        .into());
    }

    let max_tokens = parse_opt::<u32>("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS").as_deref(), "expected u32")?
        .unwrap_or(DEFAULT_MAX_NEW_TOKENS);
    let temperature = parse_opt::<f32>("LLM_TEMPERATURE", get("LLM_TEMPERATURE").as_deref(), "expected f32")?;
    let top_p = parse_opt::<f32>("LLM_TOP_P", get("LLM_TOP_P").as_deref(), "expected f32")?;

    let (model, endpoint, api_key) = match provider {
        LlmProvider::Ollama => (
            get("OLLAMA_MODEL").ok_or(ConfigError::MissingVar("OLLAMA_MODEL"))?,
            ollama_endpoint(get)?,
            None,
        ),
        _ => (
            get("HF_MODEL").unwrap_or_else(|| DEFAULT_HF_MODEL.to_string()),
            get("HF_INFERENCE_URL").unwrap_or_else(|| DEFAULT_HF_URL.to_string()),
            Some(get("HF_TOKEN").ok_or(ConfigError::MissingVar("HF_TOKEN"))?),
        ),
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: Some(max_tokens),
        temperature,
        top_p,
        timeout_secs: Some(timeout_secs(get)?),
        retry: retry_policy(get)?,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn embedding_from(get: Lookup<'_>) -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_from(get, "EMBEDDING_KIND", LlmProvider::Jina)?;
    if !provider.supports_embeddings() {
        return Err(ConfigError::UnsupportedRole {
            provider,
            role: "embeddings",
        }
        .into());
    }

    let (model, endpoint, api_key) = match provider {
        LlmProvider::Ollama => (
            get("EMBEDDING_MODEL").ok_or(ConfigError::MissingVar("EMBEDDING_MODEL"))?,
            ollama_endpoint(get)?,
            None,
        ),
        _ => (
            get("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            get("JINA_URL").unwrap_or_else(|| DEFAULT_JINA_URL.to_string()),
            Some(get("JINA_API_KEY").ok_or(ConfigError::MissingVar("JINA_API_KEY"))?),
        ),
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(timeout_secs(get)?),
        retry: retry_policy(get)?,
    };
    cfg.validate()?;
    Ok(cfg)
}

fn provider_from(
    get: Lookup<'_>,
    var: &'static str,
    default: LlmProvider,
) -> Result<LlmProvider, AiLlmError> {
    match get(var) {
        Some(raw) => Ok(raw.parse::<LlmProvider>()?),
        None => Ok(default),
    }
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint(get: Lookup<'_>) -> Result<String, AiLlmError> {
    if let Some(url) = get("OLLAMA_URL") {
        return Ok(url);
    }
    if let Some(port) = get("OLLAMA_PORT") {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

fn timeout_secs(get: Lookup<'_>) -> Result<u64, AiLlmError> {
    Ok(parse_opt::<u64>("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS").as_deref(), "expected u64")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS))
}

fn retry_policy(get: Lookup<'_>) -> Result<RetryPolicy, AiLlmError> {
    let policy = RetryPolicy::default();
    Ok(
        match parse_opt::<u32>("LLM_MAX_RETRIES", get("LLM_MAX_RETRIES").as_deref(), "expected u32")? {
            Some(n) => policy.with_max_retries(n),
            None => policy,
        },
    )
}
