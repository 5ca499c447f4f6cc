//! LLM error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to a model provider
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request blocked by the provider: {0}")]
    Blocked(String),

    #[error("No image in response (finish reason: {finish_reason})")]
    NoImage { finish_reason: String },

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Check if this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500 || *status == 408,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_)
            | LlmError::Blocked(_)
            | LlmError::NoImage { .. }
            | LlmError::NotConfigured(_)
            | LlmError::Json(_) => false,
        }
    }
}
