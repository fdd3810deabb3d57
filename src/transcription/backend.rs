//! Transcription backend trait and normalized types.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// A transcript segment normalized from any backend shape, with offsets
/// local to its own chunk's timeline until shifted by the merger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_secs: f64,
    pub end_secs: f64,
    pub text: String,
    pub speaker: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TranscribeOptions {
    /// Ask for segment-level timestamps where the backend can produce them.
    pub want_segments: bool,
    /// Ask for speaker diarization where the backend can produce it.
    pub want_speakers: bool,
}

/// What one backend call yields for one chunk: always a text body, plus
/// structured segments when the backend supports them.
#[derive(Debug, Clone, Default)]
pub struct ChunkTranscript {
    pub text: String,
    pub segments: Vec<Segment>,
}

impl ChunkTranscript {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.segments.is_empty()
    }
}

/// Remote speech-to-text capability.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Submit one audio chunk. The token aborts an in-flight request.
    async fn transcribe(
        &self,
        audio_path: &Path,
        options: TranscribeOptions,
        cancel: &CancellationToken,
    ) -> Result<ChunkTranscript>;
}
