//! Pluggable remote transcription backends.

mod backend;
mod normalize;
mod prompt_api;
mod segments_api;

pub use backend::{ChunkTranscript, Segment, TranscribeOptions, TranscriptionBackend};
pub use normalize::normalize_response;
pub use prompt_api::{PromptApiConfig, PromptBackend};
pub use segments_api::{SegmentsApiConfig, SegmentsBackend};

use crate::config::RetryConfig;
use crate::error::{EngineError, Result};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send a request, retrying transient statuses with exponential backoff and
/// aborting immediately when the token fires. `build` is called once per
/// attempt because multipart bodies cannot be cloned.
pub(crate) async fn send_with_retry<F>(
    build: F,
    retry: &RetryConfig,
    cancel: &CancellationToken,
) -> Result<reqwest::Response>
where
    F: Fn() -> Result<reqwest::RequestBuilder>,
{
    let mut delay = Duration::from_millis(retry.initial_delay_ms.max(1));
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let request = build()?;
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            res = request.send() => res?,
        };
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            text = response.text() => text.unwrap_or_default(),
        };
        if is_transient(status) && attempt < retry.max_retries {
            attempt += 1;
            log::warn!(
                "transient HTTP {} from backend; retry {}/{} in {}ms",
                status,
                attempt,
                retry.max_retries,
                delay.as_millis()
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            delay *= 2;
            continue;
        }
        return Err(if is_transient(status) {
            EngineError::RemoteTransient {
                status: status.as_u16(),
                attempts: attempt + 1,
                body,
            }
        } else {
            EngineError::RemotePermanent {
                status: status.as_u16(),
                body,
            }
        });
    }
}
