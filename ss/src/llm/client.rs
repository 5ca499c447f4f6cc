//! LlmClient and ImageClient trait definitions

use async_trait::async_trait;
#[allow(unused_imports)]
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, ImageRequest, LlmError};
use crate::domain::RenderedImage;

/// Stateless text model client - each call is independent (fresh context)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request and wait for the full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Image model client
#[async_trait]
pub trait ImageClient: Send + Sync {
    /// Render (or edit, when the request carries a source image) one image
    async fn generate(&self, request: ImageRequest) -> Result<RenderedImage, LlmError>;

    /// Download a previously uploaded image so it can be edited
    async fn fetch(&self, url: &str) -> Result<RenderedImage, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Mock text client for unit tests
    pub struct MockLlmClient {
        responses: Vec<CompletionResponse>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<CompletionResponse>) -> Self {
            debug!(response_count = %responses.len(), "MockLlmClient::new: called");
            Self {
                responses,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests seen so far, in call order
        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            self.requests.lock().unwrap().push(request);
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(idx)
                .cloned()
                .ok_or_else(|| LlmError::InvalidResponse("No more mock responses".to_string()))
        }
    }

    /// Mock image client returning one fixed image, or failing every call
    pub struct MockImageClient {
        image: Option<RenderedImage>,
        call_count: AtomicUsize,
        requests: Mutex<Vec<ImageRequest>>,
    }

    impl MockImageClient {
        pub fn new(image: RenderedImage) -> Self {
            Self {
                image: Some(image),
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                image: None,
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<ImageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageClient for MockImageClient {
        async fn generate(&self, request: ImageRequest) -> Result<RenderedImage, LlmError> {
            debug!(model = %request.model, "MockImageClient::generate: called");
            self.requests.lock().unwrap().push(request);
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.image.clone().ok_or_else(|| LlmError::NoImage {
                finish_reason: "IMAGE_SAFETY".to_string(),
            })
        }

        async fn fetch(&self, url: &str) -> Result<RenderedImage, LlmError> {
            debug!(%url, "MockImageClient::fetch: called");
            Ok(RenderedImage::from_bytes("image/png", url.as_bytes()))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::new(vec![
                CompletionResponse::text("Response 1"),
                CompletionResponse::text("Response 2"),
            ]);

            let req = CompletionRequest::new("Test", "hello", 1000);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(req).await.unwrap();
            assert_eq!(resp2.content, Some("Response 2".to_string()));

            assert_eq!(client.call_count(), 2);
            assert_eq!(client.requests()[0].prompt, "hello");
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);

            let result = client.complete(CompletionRequest::new("Test", "hello", 1000)).await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_mock_image_client_failing() {
            let client = MockImageClient::failing();
            let result = client.generate(ImageRequest::render("m", "plan")).await;
            assert!(matches!(result, Err(LlmError::NoImage { .. })));
            assert_eq!(client.call_count(), 1);
        }
    }
}
