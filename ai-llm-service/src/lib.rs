//! HTTP clients for text generation and embeddings used by the travel assistant.
//!
//! - [`service_profiles::LlmServiceProfiles`] is the entry point: one
//!   generation profile and one embedding profile, cached clients, health.
//! - [`config::default_config`] builds both profiles from the environment.
//! - [`retry::RetryPolicy`] bounds retries of transient failures.
//! - [`telemetry`] provides the log layer the binary installs.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod retry;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use error_handler::{AiLlmError, Result};
pub use service_profiles::LlmServiceProfiles;
