//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Longest slice of a provider error body kept in an error value.
const MAX_ERROR_BODY: usize = 512;

/// Errors that can occur while calling a generative provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response envelope: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider misconfigured: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Build an API error, keeping only the head of a large body.
    pub fn api(status: u16, body: &str) -> Self {
        let message = match body.char_indices().nth(MAX_ERROR_BODY) {
            Some((cut, _)) => format!("{}...", &body[..cut]),
            None => body.to_string(),
        };
        ProviderError::Api { status, message }
    }

    /// Check if this error is worth another attempt
    ///
    /// Authentication and request-shape rejections are permanent; everything
    /// that depends on provider load or on what the model happened to emit
    /// is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Api { status, .. } => *status >= 500 || *status == 408,
            ProviderError::Network(_) => true,
            ProviderError::InvalidResponse(_) => true,
            ProviderError::Timeout(_) => true,
            ProviderError::Configuration(_) => false,
        }
    }

    /// Short machine-readable kind for logs and API error details.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited { .. } => "rate_limited",
            ProviderError::Api { .. } => "api_error",
            ProviderError::Network(_) => "network",
            ProviderError::InvalidResponse(_) => "invalid_response",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Configuration(_) => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(ProviderError::RateLimited { retry_after: None }.is_retryable());
        assert!(ProviderError::api(503, "unavailable").is_retryable());
        assert!(ProviderError::api(408, "request timeout").is_retryable());
        assert!(ProviderError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ProviderError::InvalidResponse("no candidates".into()).is_retryable());

        assert!(!ProviderError::api(401, "bad key").is_retryable());
        assert!(!ProviderError::api(400, "bad request").is_retryable());
        assert!(!ProviderError::Configuration("missing key".into()).is_retryable());
    }

    #[test]
    fn test_api_body_is_truncated() {
        let body = "x".repeat(4 * MAX_ERROR_BODY);
        match ProviderError::api(500, &body) {
            ProviderError::Api { message, .. } => {
                assert_eq!(message.len(), MAX_ERROR_BODY + 3);
                assert!(message.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_kind() {
        assert_eq!(ProviderError::Timeout(Duration::from_secs(1)).kind(), "timeout");
        assert_eq!(ProviderError::api(500, "").kind(), "api_error");
    }
}
