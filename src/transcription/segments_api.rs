//! Structured transcription backend.
//!
//! Uploads the audio as multipart form data and can be asked, via capability
//! flags, for segment-level timestamps and speaker diarization. The JSON it
//! returns varies in shape; `normalize` turns it into the internal model.

use super::backend::{ChunkTranscript, TranscribeOptions, TranscriptionBackend};
use super::{normalize_response, send_with_retry};
use crate::config::RetryConfig;
use crate::error::{EngineError, Result};
use crate::transcription::prompt_api::mime_for;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Configuration for the structured backend. `base_url` is the full endpoint,
/// e.g. `http://localhost:8000/v1/audio/transcriptions`.
#[derive(Debug, Clone)]
pub struct SegmentsApiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl SegmentsApiConfig {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim().to_string(),
            model,
            api_key,
        }
    }
}

pub struct SegmentsBackend {
    config: SegmentsApiConfig,
    retry: RetryConfig,
    client: reqwest::Client,
}

impl SegmentsBackend {
    pub fn new(config: SegmentsApiConfig, retry: RetryConfig) -> Self {
        Self {
            config,
            retry,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TranscriptionBackend for SegmentsBackend {
    fn id(&self) -> &'static str {
        "segments-api"
    }

    fn name(&self) -> &'static str {
        "Segments API"
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        options: TranscribeOptions,
        cancel: &CancellationToken,
    ) -> Result<ChunkTranscript> {
        let bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();
        let mime = mime_for(audio_path);

        let response = send_with_retry(
            || {
                let part = reqwest::multipart::Part::bytes(bytes.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)?;
                let mut form = reqwest::multipart::Form::new()
                    .part("file", part)
                    .text("model", self.config.model.clone());
                if options.want_segments {
                    form = form
                        .text("response_format", "verbose_json")
                        .text("timestamp_granularities[]", "segment");
                }
                if options.want_speakers {
                    form = form.text("diarize", "true");
                }
                let mut req = self.client.post(&self.config.base_url).multipart(form);
                if let Some(ref key) = self.config.api_key {
                    req = req.bearer_auth(key);
                }
                Ok(req)
            },
            &self.retry,
            cancel,
        )
        .await?;

        let json: serde_json::Value = tokio::select! {
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            res = response.json() => res?,
        };
        let transcript = normalize_response(&json);
        if transcript.is_empty() {
            return Err(EngineError::BadResponse(
                "structured backend returned neither text nor segments".to_string(),
            ));
        }
        Ok(transcript)
    }
}
