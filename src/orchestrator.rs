//! Per-file job orchestration: probe, plan, segment, transcribe, merge,
//! persist, clean up.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::media::{chunk_file_name, detect_silences, extract_chunk, media_duration_secs};
use crate::merge::{merge_results, ChunkResult, OutputMode};
use crate::planner::plan_chunks;
use crate::progress::ProgressSink;
use crate::subtitle::write_srt;
use crate::transcription::TranscriptionBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Where a job currently is. `Cancelled` is reachable from any non-terminal
/// phase; `Failed` from `Segmenting`, `Transcribing` or `Merging`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Planning,
    Segmenting,
    Transcribing(usize),
    Merging,
    Persisting,
    Done,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone)]
pub struct JobOutput {
    pub transcript_path: PathBuf,
    pub subtitle_path: Option<PathBuf>,
}

/// Per-file result of a batch run.
#[derive(Debug)]
pub struct JobOutcome {
    pub input: PathBuf,
    pub result: Result<JobOutput>,
}

pub struct Orchestrator {
    config: EngineConfig,
    backend: Arc<dyn TranscriptionBackend>,
    progress: Arc<dyn ProgressSink>,
}

impl Orchestrator {
    pub fn new(
        config: EngineConfig,
        backend: Arc<dyn TranscriptionBackend>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            backend,
            progress,
        }
    }

    /// Transcribe one file end to end. Chunk files are removed before this
    /// returns, on success, failure and cancellation alike.
    pub async fn run_file(
        &self,
        input: &Path,
        mode: OutputMode,
        cancel: &CancellationToken,
    ) -> Result<JobOutput> {
        let mut chunk_paths: Vec<PathBuf> = Vec::new();
        let result = self.run_inner(input, mode, cancel, &mut chunk_paths).await;
        for path in &chunk_paths {
            // Removal failures are non-fatal, logged only.
            if let Err(e) = std::fs::remove_file(path) {
                log::warn!("could not remove chunk file {}: {}", path.display(), e);
            }
        }
        match &result {
            Ok(out) => {
                phase(input, JobPhase::Done);
                log::info!(
                    "finished {} -> {}",
                    input.display(),
                    out.transcript_path.display()
                );
            }
            Err(e) if e.is_cancelled() => {
                phase(input, JobPhase::Cancelled);
                log::info!("cancelled {}", input.display());
            }
            Err(e) => {
                phase(input, JobPhase::Failed);
                log::error!("failed {}: {}", input.display(), e);
            }
        }
        result
    }

    async fn run_inner(
        &self,
        input: &Path,
        mode: OutputMode,
        cancel: &CancellationToken,
        chunk_paths: &mut Vec<PathBuf>,
    ) -> Result<JobOutput> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        phase(input, JobPhase::Planning);
        self.progress.line(&format!("probing {}", input.display()));
        let total_secs = media_duration_secs(input, cancel).await?;
        let silences = detect_silences(input, &self.config.silence, cancel).await?;
        let plan = plan_chunks(total_secs, &silences, &self.config.plan);
        self.progress.line(&format!(
            "planned {} chunk(s) over {:.0}s ({} silence range(s))",
            plan.len(),
            total_secs,
            silences.len()
        ));

        phase(input, JobPhase::Segmenting);
        let run_id = short_run_id();
        let dir = input.parent().unwrap_or_else(|| Path::new("."));
        let mut chunks = Vec::with_capacity(plan.len());
        for (i, range) in plan.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let dest = dir.join(chunk_file_name(input, &run_id, i));
            chunk_paths.push(dest.clone());
            chunks.push(extract_chunk(input, *range, &dest, cancel).await?);
        }

        // Strictly sequential: the mergers dedup against "previous merged
        // output" and need chunks in timeline order.
        let options = mode.transcribe_options();
        let mut results = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            phase(input, JobPhase::Transcribing(i + 1));
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            self.progress.line(&format!(
                "transcribing chunk {}/{} ({:.1}s at +{:.1}s) via {}",
                i + 1,
                chunks.len(),
                chunk.duration_secs,
                chunk.start_offset_secs,
                self.backend.name()
            ));
            let transcript = self
                .backend
                .transcribe(&chunk.audio_path, options, cancel)
                .await?;
            if transcript.is_empty() {
                return Err(EngineError::BadResponse(format!(
                    "chunk {} produced no usable transcript",
                    i + 1
                )));
            }
            results.push(ChunkResult {
                start_offset_secs: chunk.start_offset_secs,
                transcript,
            });
        }

        phase(input, JobPhase::Merging);
        self.progress.line("merging chunk transcripts");
        let merged = merge_results(mode, &results, &self.config.merge, self.progress.as_ref())?;

        phase(input, JobPhase::Persisting);
        let transcript_path = input.with_extension("txt");
        std::fs::write(&transcript_path, merged.transcript.as_bytes())?;
        let subtitle_path = match &merged.cues {
            Some(cues) => {
                let path = input.with_extension("srt");
                write_srt(&path, cues)?;
                Some(path)
            }
            None => None,
        };
        self.progress
            .line(&format!("wrote {}", transcript_path.display()));
        Ok(JobOutput {
            transcript_path,
            subtitle_path,
        })
    }

    /// Transcribe several files, reporting per-file outcomes. One file's hard
    /// failure does not stop the rest; cancellation does.
    pub async fn run_batch(
        &self,
        inputs: &[PathBuf],
        mode: OutputMode,
        cancel: &CancellationToken,
    ) -> Vec<JobOutcome> {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = if cancel.is_cancelled() {
                Err(EngineError::Cancelled)
            } else {
                self.run_file(input, mode, cancel).await
            };
            outcomes.push(JobOutcome {
                input: input.clone(),
                result,
            });
        }
        outcomes
    }
}

fn phase(input: &Path, phase: JobPhase) {
    log::debug!("{}: {:?}", input.display(), phase);
}

fn short_run_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
