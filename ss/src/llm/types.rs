//! Provider-agnostic request/response types

use tracing::debug;

use crate::domain::RenderedImage;

/// A text completion request - everything needed for one call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from a Handlebars template)
    pub system_prompt: String,

    /// The single user turn
    pub prompt: String,

    /// Max tokens for response (capped by config)
    pub max_tokens: u32,

    /// Ask the provider for a JSON body when it supports it
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            max_tokens,
            json_output: false,
        }
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response, used by mocks and tests
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    Safety,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            "refusal" => StopReason::Safety,
            _ => StopReason::EndTurn,
        }
    }

    /// Parse from Gemini finishReason string
    pub fn from_gemini(s: &str) -> Self {
        debug!(%s, "StopReason::from_gemini: called");
        match s {
            "MAX_TOKENS" => StopReason::MaxTokens,
            "SAFETY" | "IMAGE_SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "RECITATION" => StopReason::Safety,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// An image generation or edit request
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Model id as the provider knows it
    pub model: String,

    /// Text prompt (the plan, or an edit instruction)
    pub prompt: String,

    /// Image to edit; `None` renders from scratch
    pub source: Option<RenderedImage>,
}

impl ImageRequest {
    pub fn render(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            source: None,
        }
    }

    pub fn edit(model: impl Into<String>, prompt: impl Into<String>, source: RenderedImage) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reason_parsing() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_gemini("STOP"), StopReason::EndTurn);
        assert_eq!(StopReason::from_gemini("IMAGE_SAFETY"), StopReason::Safety);
        assert_eq!(StopReason::from_gemini("MAX_TOKENS"), StopReason::MaxTokens);
    }

    #[test]
    fn test_request_builders() {
        let req = CompletionRequest::new("sys", "user", 100).with_json_output();
        assert!(req.json_output);
        assert_eq!(req.max_tokens, 100);

        let img = ImageRequest::edit("m", "make it blue", RenderedImage::new("image/png", "AAAA"));
        assert!(img.source.is_some());
        assert!(ImageRequest::render("m", "plan").source.is_none());
    }
}
