//! Per-run execution parameters and provider failure classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Per-run execution parameters (not persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub temperature: f32,
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub retry_delay: Duration,
    /// Upper bound on a single provider round-trip
    pub call_timeout: Duration,
}

impl ExecutionConfig {
    pub fn with_temperature(&self, temperature: f32) -> Self {
        Self {
            temperature,
            ..self.clone()
        }
    }

    /// Total number of provider calls allowed for one execution
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            call_timeout: Duration::from_secs(120),
        }
    }
}

/// API failure types for error handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ApiFailure {
    RateLimitExceeded,
    Timeout,
    ServerError { status: u16, message: String },
    NetworkError(String),
    AuthenticationFailed,
    MissingCredential,
    InvalidRequest(String),
    ModelUnavailable(String),
    /// The provider answered but embedded an error object in the body
    ProviderError(String),
}

impl ApiFailure {
    /// Transient failures are worth another attempt, permanent ones are not
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiFailure::RateLimitExceeded
                | ApiFailure::Timeout
                | ApiFailure::ServerError { .. }
                | ApiFailure::NetworkError(_)
        )
    }

    /// Map an HTTP status of a failed provider call onto a failure kind
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => ApiFailure::AuthenticationFailed,
            404 => ApiFailure::ModelUnavailable(message),
            408 => ApiFailure::Timeout,
            429 => ApiFailure::RateLimitExceeded,
            500..=599 => ApiFailure::ServerError { status, message },
            _ => ApiFailure::InvalidRequest(message),
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::RateLimitExceeded => write!(f, "rate limit exceeded"),
            ApiFailure::Timeout => write!(f, "request timed out"),
            ApiFailure::ServerError { status, message } => write!(f, "server error {status}: {message}"),
            ApiFailure::NetworkError(message) => write!(f, "network error: {message}"),
            ApiFailure::AuthenticationFailed => write!(f, "authentication failed"),
            ApiFailure::MissingCredential => write!(f, "missing credential"),
            ApiFailure::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            ApiFailure::ModelUnavailable(message) => write!(f, "model unavailable: {message}"),
            ApiFailure::ProviderError(message) => write!(f, "provider error: {message}"),
        }
    }
}

impl std::error::Error for ApiFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_failures_are_retryable() {
        assert!(ApiFailure::RateLimitExceeded.is_retryable());
        assert!(ApiFailure::Timeout.is_retryable());
        assert!(ApiFailure::NetworkError("reset".into()).is_retryable());
        assert!(ApiFailure::from_status(503, "unavailable").is_retryable());
    }

    #[test]
    fn test_permanent_failures_short_circuit() {
        assert!(!ApiFailure::AuthenticationFailed.is_retryable());
        assert!(!ApiFailure::ProviderError("quota".into()).is_retryable());
        assert!(!ApiFailure::from_status(400, "bad prompt").is_retryable());
        assert!(!ApiFailure::from_status(401, "").is_retryable());
        assert!(!ApiFailure::from_status(404, "no such model").is_retryable());
    }

    #[test]
    fn test_max_attempts() {
        let config = ExecutionConfig {
            max_retries: 2,
            ..ExecutionConfig::default()
        };
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.with_temperature(0.1).temperature, 0.1);
    }
}
