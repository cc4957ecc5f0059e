//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - Routes each call to the provider configured for the profile.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_embedding, config_generation};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(config_generation()?, config_embedding()?, Some(10))?);
//!
//! let answer = svc.generate("Which airport do I fly from?").await?;
//! let emb = svc.embed("flight AI 101").await?;
//! println!("{answer} / dim = {}", emb.len());
//!
//! for status in svc.health_all().await {
//!     println!("{status:?}");
//! }
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind},
    health_service::{HealthService, HealthStatus},
    services::{
        hf_inference_service::HfInferenceService, jina_service::JinaService,
        ollama_service::OllamaService,
    },
};

/// Shared service that manages the **generation** and **embedding** profiles.
///
/// Internally, it caches provider clients keyed by their configuration to
/// avoid recreating HTTP clients on each call.
pub struct LlmServiceProfiles {
    generation: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    hf: RwLock<HashMap<ClientKey, Arc<HfInferenceService>>>,
    jina: RwLock<HashMap<ClientKey, Arc<JinaService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service with both profiles.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedRole`] if a provider cannot serve its profile
    /// - validation errors from [`LlmModelConfig::validate`]
    pub fn new(
        generation: LlmModelConfig,
        embedding: LlmModelConfig,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        if !generation.provider.supports_generation() {
            return Err(ConfigError::UnsupportedRole {
                provider: generation.provider,
                role: "generation",
            }
            .into());
        }
        if !embedding.provider.supports_embeddings() {
            return Err(ConfigError::UnsupportedRole {
                provider: embedding.provider,
                role: "embeddings",
            }
            .into());
        }
        generation.validate()?;
        embedding.validate()?;

        Ok(Self {
            generation,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            hf: RwLock::new(HashMap::new()),
            jina: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if generation fails after the retry budget.
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        let cfg = &self.generation;
        match cfg.provider {
            LlmProvider::HuggingFace => self.hf_client(cfg).await?.generate(prompt).await,
            LlmProvider::Ollama => self.ollama_client(cfg).await?.generate(prompt).await,
            LlmProvider::Jina => Err(unsupported(cfg.provider, "generate")),
        }
    }

    /// Computes one embedding using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails after the retry budget.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = &self.embedding;
        match cfg.provider {
            LlmProvider::Jina => self.jina_client(cfg).await?.embeddings(input).await,
            LlmProvider::Ollama => self.ollama_client(cfg).await?.embeddings(input).await,
            LlmProvider::HuggingFace => Err(unsupported(cfg.provider, "embed")),
        }
    }

    /// Computes embeddings for many inputs in one provider request.
    ///
    /// The output has the same length and order as `inputs`.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let cfg = &self.embedding;
        match cfg.provider {
            LlmProvider::Jina => self.jina_client(cfg).await?.embeddings_batch(inputs).await,
            LlmProvider::Ollama => self.ollama_client(cfg).await?.embeddings_batch(inputs).await,
            LlmProvider::HuggingFace => Err(unsupported(cfg.provider, "embed_batch")),
        }
    }

    /// Returns a health snapshot for all distinct profiles.
    ///
    /// If both profiles point at the same config, it is checked only once.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.generation.clone()];
        if self.embedding != self.generation {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.generation, &self.embedding)
    }

    async fn ollama_client(&self, cfg: &LlmModelConfig) -> Result<Arc<OllamaService>, AiLlmError> {
        get_or_init(&self.ollama, cfg, OllamaService::new).await
    }

    async fn hf_client(&self, cfg: &LlmModelConfig) -> Result<Arc<HfInferenceService>, AiLlmError> {
        get_or_init(&self.hf, cfg, HfInferenceService::new).await
    }

    async fn jina_client(&self, cfg: &LlmModelConfig) -> Result<Arc<JinaService>, AiLlmError> {
        get_or_init(&self.jina, cfg, JinaService::new).await
    }
}

async fn get_or_init<S>(
    cache: &RwLock<HashMap<ClientKey, Arc<S>>>,
    cfg: &LlmModelConfig,
    init: fn(LlmModelConfig) -> Result<S, AiLlmError>,
) -> Result<Arc<S>, AiLlmError> {
    let key = ClientKey::from(cfg);
    if let Some(cli) = cache.read().await.get(&key).cloned() {
        return Ok(cli);
    }
    let mut w = cache.write().await;
    if let Some(cli) = w.get(&key).cloned() {
        return Ok(cli);
    }
    let cli = Arc::new(init(cfg.clone())?);
    w.insert(key, cli.clone());
    Ok(cli)
}

fn unsupported(provider: LlmProvider, op: &'static str) -> AiLlmError {
    ProviderError::new(provider, ProviderErrorKind::Unsupported(op)).into()
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;

    fn hf() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::HuggingFace,
            model: "mistralai/Mixtral-8x7B-Instruct-v0.1".into(),
            endpoint: "https://api-inference.huggingface.co".into(),
            api_key: Some("hf".into()),
            max_tokens: Some(1000),
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
            retry: RetryPolicy::none(),
        }
    }

    fn jina() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Jina,
            model: "jina-embeddings-v2-base-en".into(),
            endpoint: "https://api.jina.ai".into(),
            api_key: Some("jina".into()),
            max_tokens: None,
            ..hf()
        }
    }

    #[test]
    fn rejects_swapped_roles() {
        let err = LlmServiceProfiles::new(jina(), hf(), None).err().unwrap();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::UnsupportedRole { role: "generation", .. })
        ));
    }

    #[tokio::test]
    async fn clients_are_cached_per_config() {
        let svc = LlmServiceProfiles::new(hf(), jina(), None).unwrap();
        let a = svc.jina_client(&svc.embedding).await.unwrap();
        let b = svc.jina_client(&svc.embedding).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(svc.jina.read().await.len(), 1);
    }
}
