use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors that can occur when calling an OpenAI-compatible API
#[derive(Error, Debug)]
pub enum LlmError {
    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Model or endpoint not found (HTTP 404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Server error (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response body did not match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No API key configured
    #[error("API key not set. Set OPENAI_API_KEY or configure api_key")]
    MissingApiKey,

    /// Client could not be built from its configuration
    #[error("Invalid client configuration: {0}")]
    Configuration(String),

    /// Unexpected status code
    #[error("Unexpected status ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl LlmError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: StatusCode, body: String, retry_after: Option<Duration>) -> Self {
        match status.as_u16() {
            400 => Self::InvalidRequest(body),
            401 => Self::InvalidApiKey,
            403 => Self::Forbidden(body),
            404 => Self::NotFound(body),
            429 => Self::RateLimitExceeded { retry_after },
            500..=599 => Self::ServerError(status, body),
            _ => Self::UnknownError(status, body),
        }
    }

    /// Returns true if this error is transient and should be retried
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::ServerError(_, _) | Self::Timeout | Self::Network(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub const fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Server-provided delay before the next attempt
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<LlmError> for DomainError {
    fn from(err: LlmError) -> Self {
        Self::ExecutionFailed(err.to_string())
    }
}
