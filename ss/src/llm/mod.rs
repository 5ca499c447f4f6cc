//! Model clients for ScienceSnap
//!
//! Text completions go through [`LlmClient`] (Gemini or Anthropic), image
//! rendering and editing through [`ImageClient`] (Gemini image models).

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod gemini;
mod retry;
mod types;

pub use anthropic::AnthropicClient;
pub use client::{ImageClient, LlmClient};
pub use error::LlmError;
pub use gemini::{GeminiClient, GeminiImageClient};
pub use types::{CompletionRequest, CompletionResponse, ImageRequest, StopReason, TokenUsage};

use crate::config::{ImageConfig, LlmConfig};

/// Create a text client based on the provider specified in config
///
/// Supports "gemini" and "anthropic" providers.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::from_config(config)?)),
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::NotConfigured(format!(
                "Unknown LLM provider: '{}'. Supported: gemini, anthropic",
                other
            )))
        }
    }
}

/// Create the image client
pub fn create_image_client(config: &ImageConfig) -> Result<Arc<dyn ImageClient>, LlmError> {
    debug!(flash = %config.flash_model, pro = %config.pro_model, "create_image_client: called");
    Ok(Arc::new(GeminiImageClient::from_config(config)?))
}
