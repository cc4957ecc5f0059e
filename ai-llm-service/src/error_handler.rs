//! Errors raised by the LLM clients and their configuration.
//!
//! [`AiLlmError`] is what every public function returns. It wraps the narrower
//! [`ConfigError`], [`ProviderError`] and [`HealthError`] enums so callers can
//! match on the part they care about. Env and validation helpers live here too.
//!
//! Messages are prefixed with `[llm]` so they stand out in mixed logs.

use std::fmt;
use std::time::Duration;

pub use reqwest::StatusCode;
use thiserror::Error;

use crate::config::llm_provider::LlmProvider;

/// Crate-wide result.
pub type Result<T> = std::result::Result<T, AiLlmError>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Bad or missing settings, detected before any request is made.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A health probe could not reach or understand the provider.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// A generation or embedding call failed at the provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("[llm] http transport failed: {0}")]
    HttpTransport(#[from] reqwest::Error),

    #[error("[llm] gave up after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures, `429` and `5xx` responses are transient.
    /// Configuration, decoding and `4xx` failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            AiLlmError::Timeout(_) => true,
            AiLlmError::HttpTransport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::HttpStatus(http),
                ..
            }) => http.is_transient(),
            AiLlmError::Health(HealthError::HttpStatus(http)) => http.is_transient(),
            _ => false,
        }
    }

    /// The provider refused our credentials (`401`/`403`) or none were configured.
    /// Retrying cannot help; the profile has to be fixed.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            AiLlmError::Config(ConfigError::MissingApiKey(_)) => true,
            AiLlmError::Provider(ProviderError { kind, .. }) => match kind {
                ProviderErrorKind::MissingApiKey => true,
                ProviderErrorKind::HttpStatus(http) => http.is_auth_failure(),
                _ => false,
            },
            AiLlmError::Health(HealthError::HttpStatus(http)) => http.is_auth_failure(),
            _ => false,
        }
    }
}

/// Problems found while reading or validating a model profile.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[llm] {0} is required but not set")]
    MissingVar(&'static str),

    /// `var` held something that is not a number of the wanted type.
    #[error("[llm] {var} is not a valid number ({reason})")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// `LLM_KIND` / `EMBEDDING_KIND` named a provider we do not know.
    #[error("[llm] unknown provider '{0}'")]
    UnsupportedProvider(String),

    /// Provider cannot serve the requested role (e.g. Jina for generation).
    #[error("[llm] provider {provider:?} cannot be used for {role}")]
    UnsupportedRole {
        provider: LlmProvider,
        role: &'static str,
    },

    #[error("[llm] {var} is malformed: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    #[error("[llm] {field} out of bounds: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },

    #[error("[llm] model id is empty")]
    EmptyModel,

    /// Hosted provider configured without credentials.
    #[error("[llm] provider {0:?} requires an API key")]
    MissingApiKey(LlmProvider),
}

/// Status, URL and the first bytes of the body of a failed response.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub url: String,
    /// Trimmed, at most [`SNIPPET_CHARS`] characters.
    pub snippet: String,
}

impl HttpError {
    /// `429` and `5xx` are worth retrying.
    pub fn is_transient(&self) -> bool {
        self.status == StatusCode::TOO_MANY_REQUESTS || self.status.is_server_error()
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED || self.status == StatusCode::FORBIDDEN
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

pub const SNIPPET_CHARS: usize = 240;

/// Shortens an upstream response body for logs and error messages.
pub fn make_snippet(text: &str) -> String {
    text.trim().chars().take(SNIPPET_CHARS).collect()
}

/// Failure of a call against a concrete provider.
#[derive(Debug, Error)]
#[error("[llm] {provider:?}: {kind}")]
pub struct ProviderError {
    pub provider: LlmProvider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: LlmProvider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// Client built from a profile that names another provider.
    #[error("profile belongs to another provider")]
    InvalidProvider,

    #[error("missing API key")]
    MissingApiKey,

    #[error("{0}")]
    HttpStatus(HttpError),

    #[error("unreadable response: {0}")]
    Decode(String),

    /// Response decoded but carried no usable output.
    #[error("empty response")]
    EmptyResponse,

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Why a probe reported a provider as down.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("[llm] endpoint '{0}' is not an http(s) URL")]
    InvalidEndpoint(String),

    #[error("[llm] {0}")]
    HttpStatus(HttpError),

    #[error("[llm] unreadable probe response: {0}")]
    Decode(String),
}

/// Reads an env var, treating blank values as unset.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `raw` when present. `var` and `reason` end up in the error.
pub(crate) fn parse_opt<T: std::str::FromStr>(
    var: &'static str,
    raw: Option<&str>,
    reason: &'static str,
) -> Result<Option<T>> {
    let Some(v) = raw else {
        return Ok(None);
    };
    v.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { var, reason }.into())
}

/// Accepts only `http://` and `https://` URLs.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    let v = value.trim();
    if !(v.starts_with("http://") || v.starts_with("https://")) {
        return Err(ConfigError::InvalidFormat {
            var,
            reason: "expected an http:// or https:// URL",
        }
        .into());
    }
    Ok(())
}

/// Fails with [`ConfigError::OutOfRange`] unless `min <= value <= max`. NaN never passes.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if (min..=max).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        field,
        detail: "outside the allowed interval",
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> HttpError {
        HttpError {
            status: StatusCode::from_u16(code).unwrap(),
            url: "https://api.example/x".into(),
            snippet: "".into(),
        }
    }

    #[test]
    fn transient_classification() {
        assert!(AiLlmError::Timeout(Duration::from_secs(1)).is_transient());
        let throttled = ProviderError::new(LlmProvider::Jina, ProviderErrorKind::HttpStatus(status(429)));
        assert!(AiLlmError::from(throttled).is_transient());
        let unavailable =
            ProviderError::new(LlmProvider::HuggingFace, ProviderErrorKind::HttpStatus(status(503)));
        assert!(AiLlmError::from(unavailable).is_transient());

        let unauthorized =
            ProviderError::new(LlmProvider::HuggingFace, ProviderErrorKind::HttpStatus(status(401)));
        assert!(!AiLlmError::from(unauthorized).is_transient());
        assert!(!AiLlmError::from(ConfigError::EmptyModel).is_transient());
    }

    #[test]
    fn rejected_credentials_are_permanent() {
        for code in [401, 403] {
            let err = AiLlmError::from(ProviderError::new(
                LlmProvider::Jina,
                ProviderErrorKind::HttpStatus(status(code)),
            ));
            assert!(err.is_auth_failure(), "{code}");
            assert!(!err.is_transient(), "{code}");
        }
        let no_key = AiLlmError::from(ProviderError::new(LlmProvider::Jina, ProviderErrorKind::MissingApiKey));
        assert!(no_key.is_auth_failure());

        let throttled = ProviderError::new(LlmProvider::Jina, ProviderErrorKind::HttpStatus(status(429)));
        assert!(!AiLlmError::from(throttled).is_auth_failure());
        assert!(!AiLlmError::Timeout(Duration::from_secs(1)).is_auth_failure());
    }

    #[test]
    fn snippet_is_bounded() {
        let body = "x".repeat(1000);
        assert_eq!(make_snippet(&body).len(), SNIPPET_CHARS);
        assert_eq!(make_snippet("  short \n"), "short");
    }

    #[test]
    fn parse_opt_reports_variable() {
        assert_eq!(parse_opt::<u32>("N", Some(" 12 "), "expected u32").unwrap(), Some(12));
        assert_eq!(parse_opt::<u32>("N", None, "expected u32").unwrap(), None);
        assert!(matches!(
            parse_opt::<u32>("N", Some("twelve"), "expected u32"),
            Err(AiLlmError::Config(ConfigError::InvalidNumber { var: "N", .. }))
        ));
    }

    #[test]
    fn endpoint_and_range_validation() {
        assert!(validate_http_endpoint("X", "https://api.jina.ai").is_ok());
        assert!(validate_http_endpoint("X", "ftp://nope").is_err());
        assert!(validate_range_f32("t", 0.5, 0.0, 1.0).is_ok());
        assert!(validate_range_f32("t", 1.0, 0.0, 1.0).is_ok());
        assert!(validate_range_f32("t", f32::NAN, 0.0, 1.0).is_err());
    }
}
