use serde::Deserialize;

use crate::error_handler::AppError;

/// Request payload for `/ask` and `/retrieve`.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    pub question: String,
    /// Optional override: number of candidates from the vector index.
    #[serde(default)]
    pub k: Option<usize>,
    /// Optional override: minimum similarity score (inclusive).
    #[serde(default)]
    pub score_threshold: Option<f32>,
}

impl AskRequest {
    /// Trimmed question; blank questions are rejected.
    pub fn question(&self) -> Result<&str, AppError> {
        let q = self.question.trim();
        if q.is_empty() {
            return Err(AppError::BadRequest("question must not be empty".into()));
        }
        Ok(q)
    }
}
