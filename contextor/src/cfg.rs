//! Runtime configuration loaded from environment variables.
//!
//! - `TOP_K` = candidates per question, default `3`
//! - `SCORE_THRESHOLD` = minimum similarity, default `0.7`
//! - `PROMPT_TEMPLATE_PATH` = optional template file replacing the built-in prompt
//!
//! Index settings are read by [`RagConfig::from_env`].

use std::path::PathBuf;
use std::str::FromStr;

use ai_llm_service::error_handler::env_opt;
use rag_store::{DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_K, RagConfig, RelevanceQuery};

use crate::error::ContextorError;
use crate::prompt::PromptTemplate;

/// Config bag for the assistant.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    pub top_k: usize,
    pub score_threshold: f32,
    pub prompt_template_path: Option<PathBuf>,
    pub rag: RagConfig,
}

impl ContextorConfig {
    /// Builds the config with defaults for everything but the index settings.
    pub fn new(rag: RagConfig) -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            prompt_template_path: None,
            rag,
        }
    }

    /// Build from environment variables with sensible defaults.
    ///
    /// # Errors
    /// [`ContextorError::Config`] for malformed values, or a rag-store config error.
    pub fn from_env() -> Result<Self, ContextorError> {
        let rag = RagConfig::from_env()?;
        Self::from_lookup(rag, &env_opt)
    }

    fn from_lookup(
        rag: RagConfig,
        get: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ContextorError> {
        let cfg = Self {
            top_k: parse(get, "TOP_K", DEFAULT_TOP_K)?,
            score_threshold: parse(get, "SCORE_THRESHOLD", DEFAULT_SCORE_THRESHOLD)?,
            prompt_template_path: get("PROMPT_TEMPLATE_PATH").map(PathBuf::from),
            rag,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Default query parameters must themselves be a valid query.
    pub fn validate(&self) -> Result<(), ContextorError> {
        RelevanceQuery::new("")
            .with_k(self.top_k)
            .with_threshold(self.score_threshold)
            .validate()
            .map_err(|e| ContextorError::Config(e.to_string()))
    }

    /// The configured template file, or the built-in prompt.
    pub fn load_template(&self) -> Result<PromptTemplate, ContextorError> {
        match &self.prompt_template_path {
            Some(p) => Ok(PromptTemplate::load(p)?),
            None => Ok(PromptTemplate::builtin()),
        }
    }
}

fn parse<T: FromStr>(
    get: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ContextorError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ContextorError::Config(format!("{key} has an invalid value '{raw}'"))),
        None => Ok(default),
    }
}
