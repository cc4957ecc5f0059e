//! HTTP surface of the travel assistant.
//!
//! - `POST /ask`      → answer + the documents it was grounded on
//! - `POST /retrieve` → retrieval outcome (context, documents, prompt), no generation
//! - `GET  /health`   → inference / embedding endpoint health

pub mod core;
pub mod error_handler;
mod middleware_layer;
pub mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use crate::core::app_state::{ApiConfig, AppState};
pub use crate::error_handler::AppError;

use crate::routes::{
    ask::ask_question_route::ask_question, health::health_route::health,
    retrieve::retrieve_route::retrieve,
};

/// All routes with shared state and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask_question))
        .route("/retrieve", post(retrieve))
        .route("/health", get(health))
        .layer(middleware::from_fn(
            middleware_layer::json_extractor::json_error_mapper,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] if the address cannot be bound, [`AppError::Server`] on I/O failure.
pub async fn start(state: AppState, cfg: &ApiConfig) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(&cfg.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %cfg.address, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;
    info!("HTTP server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
