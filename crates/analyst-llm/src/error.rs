//! Error types for LLM operations

use std::time::Duration;
use thiserror::Error;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not found
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// Upstream returned a 5xx status
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The call did not finish within the per-call budget
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Unexpected response format
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Provider-specific error
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// No candidate provider has a usable credential
    #[error("No model provider with a usable credential is configured")]
    NoProviderAvailable,
}

impl LLMError {
    /// Whether another provider might succeed where this one failed
    ///
    /// Rate limits, connection problems, timeouts and upstream 5xx are
    /// transient. Authentication, bad requests, unknown models, malformed
    /// responses and configuration problems are permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LLMError::RateLimitExceeded(_)
            | LLMError::ServiceUnavailable(_)
            | LLMError::Timeout(_) => true,
            LLMError::HttpError(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }
}
