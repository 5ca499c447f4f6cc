//! Google Gemini API clients
//!
//! One `generateContent` endpoint serves both text and image models, so the
//! text client ([`GeminiClient`]) and the image client ([`GeminiImageClient`])
//! share the request/retry plumbing and the response types.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::retry::send_with_retry;
use super::{CompletionRequest, CompletionResponse, ImageClient, ImageRequest, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::{ImageConfig, LlmConfig};
use crate::domain::RenderedImage;

/// POST a `generateContent` body for `model`
async fn generate_content(
    http: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    body: &serde_json::Value,
) -> Result<GeminiResponse, LlmError> {
    debug!(%model, "generate_content: called");
    let url = format!("{}/v1beta/models/{}:generateContent", base_url.trim_end_matches('/'), model);

    let response = send_with_retry("gemini", || http.post(&url).header("x-goog-api-key", api_key).json(body)).await?;
    let api_response: GeminiResponse = response.json().await?;
    Ok(api_response)
}

/// Gemini text client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl GeminiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, "GeminiClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::NotConfigured(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let mut body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens.min(self.max_tokens),
            },
        });

        if request.json_output {
            body["generationConfig"]["responseMimeType"] = serde_json::json!("application/json");
        }

        body
    }

    fn parse_response(&self, api_response: GeminiResponse) -> Result<CompletionResponse, LlmError> {
        debug!("parse_response: called");
        if let Some(reason) = api_response.block_reason() {
            return Err(LlmError::Blocked(reason));
        }

        let usage = api_response.token_usage();
        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        Ok(CompletionResponse {
            content: if text.is_empty() { None } else { Some(text) },
            stop_reason: candidate
                .finish_reason
                .as_deref()
                .map(StopReason::from_gemini)
                .unwrap_or(StopReason::EndTurn),
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, json = request.json_output, "complete: called");
        let body = self.build_request_body(&request);
        let api_response = generate_content(&self.http, &self.base_url, &self.api_key, &self.model, &body).await?;
        self.parse_response(api_response)
    }
}

/// Gemini image client (flash and pro image models)
pub struct GeminiImageClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeminiImageClient {
    pub fn from_config(config: &ImageConfig) -> Result<Self, LlmError> {
        debug!(base_url = %config.base_url, "GeminiImageClient::from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::NotConfigured(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.clone(),
            http,
        })
    }

    fn build_request_body(request: &ImageRequest) -> serde_json::Value {
        debug!(model = %request.model, edit = request.source.is_some(), "build_request_body: called");
        let mut parts = Vec::new();
        if let Some(source) = &request.source {
            parts.push(serde_json::json!({
                "inlineData": { "mimeType": source.mime_type, "data": source.data }
            }));
        }
        parts.push(serde_json::json!({ "text": request.prompt }));

        serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseModalities": ["IMAGE"] },
        })
    }

    fn parse_response(api_response: GeminiResponse) -> Result<RenderedImage, LlmError> {
        debug!("parse_response: called");
        if let Some(reason) = api_response.block_reason() {
            return Err(LlmError::Blocked(reason));
        }

        let candidate = api_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No candidates in response".to_string()))?;

        let finish_reason = candidate.finish_reason.unwrap_or_else(|| "UNKNOWN".to_string());
        candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .find_map(|p| p.inline_data)
            .map(|d| RenderedImage::new(d.mime_type, d.data))
            .ok_or(LlmError::NoImage { finish_reason })
    }
}

#[async_trait]
impl ImageClient for GeminiImageClient {
    async fn generate(&self, request: ImageRequest) -> Result<RenderedImage, LlmError> {
        debug!(model = %request.model, "generate: called");
        let body = Self::build_request_body(&request);
        let api_response = generate_content(&self.http, &self.base_url, &self.api_key, &request.model, &body).await?;
        Self::parse_response(api_response)
    }

    async fn fetch(&self, url: &str) -> Result<RenderedImage, LlmError> {
        debug!(%url, "fetch: called");
        let response = self.http.get(url).send().await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        let mime_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_string())
            .filter(|s| s.starts_with("image/"))
            .unwrap_or_else(|| "image/png".to_string());

        let bytes = response.bytes().await?;
        Ok(RenderedImage::from_bytes(mime_type, &bytes))
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

impl GeminiResponse {
    fn block_reason(&self) -> Option<String> {
        self.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone())
    }

    fn token_usage(&self) -> TokenUsage {
        self.usage_metadata
            .as_ref()
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count.unwrap_or(0),
                output_tokens: u.candidates_token_count.unwrap_or(0),
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_client() -> GeminiClient {
        GeminiClient {
            model: "gemini-2.5-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens: 2048,
        }
    }

    #[test]
    fn test_build_text_body() {
        let client = text_client();
        let body = client.build_request_body(&CompletionRequest::new("You are a scientist", "volcanoes", 1000));

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a scientist");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "volcanoes");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_build_text_body_json_and_capped() {
        let client = text_client();
        let body = client.build_request_body(&CompletionRequest::new("s", "p", 100_000).with_json_output());

        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_parse_text_response_skips_thoughts() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "thinking...", "thought": true}, {"text": "[{\"title\":\"A\"}]"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 34}
        }"#;
        let api_response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let response = text_client().parse_response(api_response).unwrap();

        assert_eq!(response.content.as_deref(), Some(r#"[{"title":"A"}]"#));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 34);
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let api_response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let err = text_client().parse_response(api_response).unwrap_err();
        assert!(matches!(err, LlmError::Blocked(reason) if reason == "SAFETY"));
    }

    #[test]
    fn test_build_image_body() {
        let body = GeminiImageClient::build_request_body(&ImageRequest::render("img-model", "PLAN: title"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "PLAN: title");
        assert_eq!(body["generationConfig"]["responseModalities"][0], "IMAGE");

        let source = RenderedImage::new("image/png", "AAAA");
        let body = GeminiImageClient::build_request_body(&ImageRequest::edit("img-model", "add a sun", source));
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(body["contents"][0]["parts"][0]["inlineData"]["data"], "AAAA");
        assert_eq!(body["contents"][0]["parts"][1]["text"], "add a sun");
    }

    #[test]
    fn test_parse_image_response() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Here you go"}, {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}]},
                "finishReason": "STOP"
            }]
        }"#;
        let api_response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let image = GeminiImageClient::parse_response(api_response).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_parse_image_response_without_image() {
        let raw = r#"{"candidates": [{"content": {"parts": [{"text": "I can't draw that"}]}, "finishReason": "IMAGE_SAFETY"}]}"#;
        let api_response: GeminiResponse = serde_json::from_str(raw).unwrap();
        let err = GeminiImageClient::parse_response(api_response).unwrap_err();
        assert!(matches!(err, LlmError::NoImage { finish_reason } if finish_reason == "IMAGE_SAFETY"));
    }
}
