//! JSON body for every error the API returns:
//! `{"success": false, "error": {"code": "...", "message": "...", "hint": "..."}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ApiErrorBody,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    /// `INVALID_QUERY`, `UPSTREAM_UNAVAILABLE`, `NOT_FOUND`, ...
    pub code: &'static str,
    pub message: String,
    /// What the client can change to make the request succeed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        ApiErrorResponse {
            success: false,
            error: ApiErrorBody {
                code,
                message: message.into(),
                hint: None,
            },
        }
    }

    pub fn with_hint(mut self, hint: Option<String>) -> Self {
        self.error.hint = hint;
        self
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
