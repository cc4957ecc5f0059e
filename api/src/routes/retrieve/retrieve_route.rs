//! POST /retrieve: the retrieval outcome without generation.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use contextor::RetrievalOutcome;

use crate::{core::app_state::AppState, error_handler::AppResult, routes::ask::ask_request::AskRequest};

pub async fn retrieve(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Json<RetrievalOutcome>> {
    let Json(body) = payload?;
    let outcome = state
        .assistant
        .retrieve(body.question()?, body.k, body.score_threshold)
        .await?;
    Ok(Json(outcome))
}
