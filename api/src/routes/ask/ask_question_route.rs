//! POST /ask: retrieval, prompt assembly and generation.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use contextor::QaAnswer;
use tracing::info;

use crate::{core::app_state::AppState, error_handler::AppResult, routes::ask::ask_request::AskRequest};

/// Handler: POST /ask
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"When does my flight to London leave?","k":3,"score_threshold":0.7}'
/// ```
pub async fn ask_question(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<QaAnswer>> {
    let Json(body) = payload?;
    let question = body.question()?;
    let answer = state
        .assistant
        .ask(question, body.k, body.score_threshold)
        .await?;
    info!(docs = answer.similar_docs.len(), "question answered");
    Ok(Json(answer))
}
