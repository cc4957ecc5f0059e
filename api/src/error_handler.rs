use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use rag_store::RagError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiErrorResponse;

/// Everything a handler or the server loop can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Error mapped from the assistant with a specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,
            AppError::Config(_) | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        }
        ApiErrorResponse::new(self.error_code(), self.to_string())
            .into_response_with_status(status)
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

/// Invalid queries are the caller's fault (400), misconfiguration and rejected
/// credentials are `CONFIG_ERROR` (500), failing collaborators are a bad
/// gateway (502), everything else is ours (500).
impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        if err.is_config() {
            return AppError::Config(err.to_string());
        }
        let (status, code) = if err.is_invalid_query() {
            (StatusCode::BAD_REQUEST, "INVALID_QUERY")
        } else if err.is_transient() {
            (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE")
        } else if matches!(err, ContextorError::Rag(RagError::ProvisioningPartial { .. })) {
            (StatusCode::INTERNAL_SERVER_ERROR, "INDEX_NOT_READY")
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        };
        AppError::Http {
            status,
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn maps_assistant_errors_to_status() {
        let cases = [
            (ContextorError::from(RagError::InvalidQuery("k".into())), StatusCode::BAD_REQUEST),
            (ContextorError::from(RagError::Embedding("503".into())), StatusCode::BAD_GATEWAY),
            (
                ContextorError::from(ai_llm_service::AiLlmError::Timeout(Duration::from_secs(1))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ContextorError::from(RagError::Config("dimension".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, want) in cases {
            let msg = err.to_string();
            assert_eq!(AppError::from(err).status_code(), want, "{msg}");
        }
    }

    #[test]
    fn rejected_credentials_are_not_a_gateway_error() {
        use ai_llm_service::config::llm_provider::LlmProvider;
        use ai_llm_service::error_handler::{HttpError, ProviderError, ProviderErrorKind};

        let unauthorized = ai_llm_service::AiLlmError::from(ProviderError::new(
            LlmProvider::HuggingFace,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::UNAUTHORIZED,
                url: "https://api-inference.huggingface.co/models/m".into(),
                snippet: "Invalid credentials".into(),
            }),
        ));

        let generation = AppError::from(ContextorError::from(unauthorized));
        assert!(matches!(generation, AppError::Config(_)));
        assert_eq!(generation.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let embedding = AppError::from(ContextorError::from(RagError::Config("rejected".into())));
        assert!(matches!(embedding, AppError::Config(_)));
    }
}
