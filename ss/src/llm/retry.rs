//! Retry policy shared by the HTTP model clients

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use tracing::{debug, warn};

use super::LlmError;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Used when a 429 carries no usable `retry-after`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504 | 529)
}

/// Delay before retry `attempt` (1-based), doubling each time
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(INITIAL_BACKOFF_MS * 2u64.pow(attempt.saturating_sub(1)))
}

fn retry_after(response: &Response) -> Duration {
    let secs = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}

/// Send a request, retrying network errors and transient statuses
///
/// `build` is called once per attempt. A 429 that outlasts the retries
/// becomes [`LlmError::RateLimited`]; any other failure status becomes
/// [`LlmError::ApiError`] with the response body.
pub(crate) async fn send_with_retry<F>(provider: &'static str, build: F) -> Result<Response, LlmError>
where
    F: Fn() -> RequestBuilder,
{
    let mut last_error = None;
    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = backoff(attempt);
            warn!(provider, attempt, delay_ms = delay.as_millis() as u64, "Retrying model call");
            tokio::time::sleep(delay).await;
        }

        let response = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(provider, attempt, error = %e, "send_with_retry: network error");
                last_error = Some(LlmError::Network(e));
                continue;
            }
        };

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        if status == 429 && attempt == MAX_RETRIES {
            return Err(LlmError::RateLimited {
                retry_after: retry_after(&response),
            });
        }

        let message = response.text().await.unwrap_or_default();
        if is_retryable_status(status) && attempt < MAX_RETRIES {
            debug!(provider, attempt, status, "send_with_retry: transient status");
            last_error = Some(LlmError::ApiError { status, message });
            continue;
        }

        debug!(provider, status, "send_with_retry: API error");
        return Err(LlmError::ApiError { status, message });
    }

    Err(last_error.unwrap_or_else(|| LlmError::InvalidResponse("Max retries exceeded".to_string())))
}
