//! Prompt-driven transcription backend.
//!
//! Sends a prompt string plus inline base64 audio and a model identifier;
//! gets freeform text back. Timestamps come back as inline bracket tokens
//! (`[MM:SS]` or `[HH:MM:SS]`) which are deliberately never parsed into
//! segments: the plain merger shifts them by regex instead.

use super::backend::{ChunkTranscript, TranscribeOptions, TranscriptionBackend};
use super::send_with_retry;
use crate::config::RetryConfig;
use crate::error::{EngineError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::Path;
use tokio_util::sync::CancellationToken;

const PLAIN_PROMPT: &str = "Transcribe this audio recording verbatim. Prefix each paragraph \
with its start time as [MM:SS] (or [HH:MM:SS] past one hour). Output only the transcript.";

const SUBTITLE_PROMPT: &str = "Transcribe this audio recording as SubRip (SRT) subtitles: \
sequential indices, HH:MM:SS,mmm --> HH:MM:SS,mmm time lines, one blank line between cues. \
Output only the SRT document.";

const INTERVIEW_PROMPT: &str = "Transcribe this audio recording as a JSON array of speaker \
turns, each object shaped {\"speaker\": \"...\", \"transcription\": \"...\"}. Label speakers \
consistently. Output only the JSON array.";

/// Configuration for the prompt backend. `base_url` is the full endpoint.
#[derive(Debug, Clone)]
pub struct PromptApiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl PromptApiConfig {
    pub fn new(base_url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim().to_string(),
            model,
            api_key,
        }
    }
}

pub struct PromptBackend {
    config: PromptApiConfig,
    retry: RetryConfig,
    client: reqwest::Client,
}

impl PromptBackend {
    pub fn new(config: PromptApiConfig, retry: RetryConfig) -> Self {
        Self {
            config,
            retry,
            client: reqwest::Client::new(),
        }
    }

    fn prompt_for(options: TranscribeOptions) -> &'static str {
        if options.want_speakers {
            INTERVIEW_PROMPT
        } else if options.want_segments {
            SUBTITLE_PROMPT
        } else {
            PLAIN_PROMPT
        }
    }
}

#[async_trait]
impl TranscriptionBackend for PromptBackend {
    fn id(&self) -> &'static str {
        "prompt-api"
    }

    fn name(&self) -> &'static str {
        "Prompt API"
    }

    async fn transcribe(
        &self,
        audio_path: &Path,
        options: TranscribeOptions,
        cancel: &CancellationToken,
    ) -> Result<ChunkTranscript> {
        let bytes = tokio::fs::read(audio_path).await?;
        let payload = serde_json::json!({
            "model": self.config.model,
            "prompt": Self::prompt_for(options),
            "audio": {
                "mime_type": mime_for(audio_path),
                "data": BASE64.encode(&bytes),
            },
        });

        let response = send_with_retry(
            || {
                let mut req = self.client.post(&self.config.base_url).json(&payload);
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
        let text = ["text", "output_text", "response"]
            .iter()
            .find_map(|name| json.get(name).and_then(|v| v.as_str()))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(EngineError::BadResponse(
                "prompt backend returned no text".to_string(),
            ));
        }
        Ok(ChunkTranscript {
            text,
            segments: Vec::new(),
        })
    }
}

pub(crate) fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "opus" => "audio/ogg",
        "m4a" | "mp4" | "aac" => "audio/mp4",
        "mka" | "webm" => "audio/webm",
        _ => "audio/mpeg",
    }
}
