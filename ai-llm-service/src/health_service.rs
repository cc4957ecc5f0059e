//! Liveness probes for the configured model providers.
//!
//! | provider     | probe                                   |
//! |--------------|-----------------------------------------|
//! | Ollama       | `GET /api/tags`, model must be listed   |
//! | Hugging Face | `GET /status/{model}` with bearer token |
//! | Jina         | `POST /v1/embeddings` for `"ping"`      |
//!
//! [`HealthService::check`] does not return errors: a failed probe is an
//! `ok: false` [`HealthStatus`] carrying the reason.

use std::time::{Duration, Instant};

use reqwest::{RequestBuilder, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};

/// Result of probing one profile, shaped for the `/health` response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// `"Ollama"`, `"HuggingFace"` or `"Jina"`.
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub ok: bool,
    /// Round trip of the probe request.
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn from_probe(cfg: &LlmModelConfig, ok: bool, latency_ms: u128, message: impl Into<String>) -> Self {
        HealthStatus {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }

    fn up(cfg: &LlmModelConfig, latency_ms: u128, message: impl Into<String>) -> Self {
        Self::from_probe(cfg, true, latency_ms, message)
    }

    fn down(cfg: &LlmModelConfig, latency_ms: u128, message: impl Into<String>) -> Self {
        Self::from_probe(cfg, false, latency_ms, message)
    }
}

/// Runs probes over one shared `reqwest` client.
pub struct HealthService {
    http: reqwest::Client,
    max_timeout: Duration,
}

impl HealthService {
    /// `timeout_secs` caps every probe; defaults to 10 seconds.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let max_timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let http = reqwest::Client::builder().timeout(max_timeout).build()?;
        info!(timeout_secs = max_timeout.as_secs(), "health checker ready");
        Ok(Self { http, max_timeout })
    }

    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let started = Instant::now();
        let probed = match cfg.provider {
            LlmProvider::Ollama => self.probe_ollama(cfg).await,
            LlmProvider::HuggingFace => self.probe_hf(cfg).await,
            LlmProvider::Jina => self.probe_jina(cfg).await,
        };

        let status = probed.unwrap_or_else(|err| {
            HealthStatus::down(cfg, started.elapsed().as_millis(), err.to_string())
        });
        if status.ok {
            info!(provider = %status.provider, model = %cfg.model, latency_ms = status.latency_ms, "provider healthy");
        } else {
            warn!(
                provider = %status.provider,
                endpoint = %status.endpoint,
                latency_ms = status.latency_ms,
                reason = %status.message,
                "provider unhealthy"
            );
        }
        status
    }

    /// Probes `configs` one after another, preserving order.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(profiles = configs.len(), "probing providers");
        let mut statuses = Vec::new();
        for cfg in configs {
            statuses.push(self.check(cfg).await);
        }
        statuses
    }

    async fn probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", base(cfg)?);
        let (resp, latency) = self.send(cfg, self.http.get(&url), &url).await?;

        #[derive(Deserialize)]
        struct Listed {
            name: String,
        }
        #[derive(Deserialize)]
        struct TagList {
            #[serde(default)]
            models: Option<Vec<Listed>>,
        }

        let list = match resp.json::<TagList>().await {
            Ok(list) => list,
            Err(e) => return Ok(HealthStatus::up(cfg, latency, format!("Ollama answered; tag list unreadable: {e}"))),
        };
        let Some(models) = list.models else {
            return Ok(HealthStatus::up(cfg, latency, "Ollama answered without a model list"));
        };
        // Untagged models show up as `<name>:latest`.
        let latest = format!("{}:latest", cfg.model);
        if models.iter().any(|m| m.name == cfg.model || m.name == latest) {
            Ok(HealthStatus::up(cfg, latency, "Ollama up, model pulled"))
        } else {
            Ok(HealthStatus::down(cfg, latency, format!("Ollama up, but '{}' is not pulled", cfg.model)))
        }
    }

    async fn probe_hf(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/status/{}", base(cfg)?, cfg.model.trim());
        let req = with_bearer(self.http.get(&url), cfg)?;
        let (resp, latency) = self.send(cfg, req, &url).await?;

        #[derive(Deserialize)]
        struct ModelState {
            #[serde(default)]
            loaded: bool,
            #[serde(default)]
            state: Option<String>,
        }

        let message = match resp.json::<ModelState>().await {
            Ok(m) => format!(
                "Hugging Face up; state={}, loaded={}",
                m.state.as_deref().unwrap_or("unknown"),
                m.loaded
            ),
            Err(e) => format!("Hugging Face up; status body unreadable: {e}"),
        };
        Ok(HealthStatus::up(cfg, latency, message))
    }

    async fn probe_jina(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/v1/embeddings", base(cfg)?);
        let payload = serde_json::json!({ "model": cfg.model, "input": ["ping"] });
        let req = with_bearer(self.http.post(&url).json(&payload), cfg)?;
        let (_, latency) = self.send(cfg, req, &url).await?;
        Ok(HealthStatus::up(cfg, latency, "Jina up, embedding accepted"))
    }

    /// Sends `req` bounded by the smaller of the profile and service timeouts.
    async fn send(
        &self,
        cfg: &LlmModelConfig,
        req: RequestBuilder,
        url: &str,
    ) -> Result<(reqwest::Response, u128), AiLlmError> {
        let limit = match cfg.timeout_secs {
            Some(s) => Duration::from_secs(s).min(self.max_timeout),
            None => self.max_timeout,
        };

        debug!(provider = ?cfg.provider, %url, "sending probe");
        let t0 = Instant::now();
        let resp = req.timeout(limit).send().await?;
        let latency = t0.elapsed().as_millis();

        let code = resp.status();
        if code.is_success() {
            return Ok((resp, latency));
        }
        let body = resp.text().await.unwrap_or_default();
        Err(HealthError::HttpStatus(HttpError {
            status: code,
            url: url.to_owned(),
            snippet: make_snippet(&body),
        })
        .into())
    }
}

fn base(cfg: &LlmModelConfig) -> Result<&str, AiLlmError> {
    let base = cfg.base_url();
    if base.starts_with("http://") || base.starts_with("https://") {
        Ok(base)
    } else {
        Err(HealthError::InvalidEndpoint(cfg.endpoint.clone()).into())
    }
}

fn with_bearer(req: RequestBuilder, cfg: &LlmModelConfig) -> Result<RequestBuilder, AiLlmError> {
    let key = cfg
        .api_key
        .as_deref()
        .ok_or_else(|| HealthError::Decode("missing API key".into()))?;
    let value = header::HeaderValue::from_str(&format!("Bearer {}", key.trim()))
        .map_err(|e| HealthError::Decode(format!("invalid API key header: {e}")))?;
    Ok(req.header(header::AUTHORIZATION, value))
}
