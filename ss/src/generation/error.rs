//! Generation error types

use thiserror::Error;

use crate::llm::LlmError;

/// Any failure of an AI generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Source image unusable: {0}")]
    SourceImage(String),
}

impl GenerationError {
    /// Short user-facing reason, without provider payloads
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::Llm(LlmError::RateLimited { .. }) => "the model is rate limited, try again shortly",
            GenerationError::Llm(LlmError::Blocked(_)) | GenerationError::Llm(LlmError::NoImage { .. }) => {
                "the model declined this request"
            }
            GenerationError::Llm(LlmError::NotConfigured(_)) => "the model client is not configured",
            GenerationError::Llm(_) => "the model service could not be reached",
            GenerationError::Prompt(_) => "a prompt template is broken",
            GenerationError::MalformedResponse(_) | GenerationError::EmptyResponse => {
                "the model returned an unusable answer"
            }
            GenerationError::SourceImage(_) => "the image to edit could not be loaded",
        }
    }

    /// Whether the same call might succeed if tried again
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Llm(e) => e.is_retryable(),
            GenerationError::MalformedResponse(_) | GenerationError::EmptyResponse => true,
            GenerationError::Prompt(_) | GenerationError::SourceImage(_) => false,
        }
    }
}
