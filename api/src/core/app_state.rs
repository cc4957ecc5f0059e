use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contextor::TravelAssistant;

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:8080";

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Provisioned assistant used by `/ask` and `/retrieve`.
    pub assistant: Arc<TravelAssistant>,
    /// Inference and embedding profiles probed by `/health`; `None` reports no endpoints.
    pub llm: Option<Arc<LlmServiceProfiles>>,
}

impl AppState {
    pub fn new(assistant: Arc<TravelAssistant>, llm: Option<Arc<LlmServiceProfiles>>) -> Self {
        Self { assistant, llm }
    }
}

/// Listener settings.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub address: String,
}

impl ApiConfig {
    /// Reads `API_ADDRESS` (default `127.0.0.1:8080`).
    pub fn from_env() -> Self {
        Self {
            address: ai_llm_service::error_handler::env_opt("API_ADDRESS")
                .unwrap_or_else(|| DEFAULT_API_ADDRESS.to_string()),
        }
    }
}
