//! Reassembly of per-chunk results into one coherent output.

mod interview;
mod plain;
mod srt;

pub use interview::{entries_from_transcript, format_interview, merge_interview, InterviewEntry};
pub use plain::{merge_plain, shift_bracket_timestamps};
pub use srt::{merge_srt, srt_transcript};

use crate::config::MergeConfig;
use crate::error::{EngineError, Result};
use crate::progress::ProgressSink;
use crate::subtitle::{cues_from_segments, looks_like_srt, parse_srt, SrtCue};
use crate::transcription::{ChunkTranscript, TranscribeOptions};

/// Target representation of a finished transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Plain timestamped transcript.
    Plain,
    /// SRT subtitle cues plus a derived transcript view.
    Subtitles,
    /// Speaker-attributed interview transcript.
    Interview,
}

impl OutputMode {
    pub fn transcribe_options(self) -> TranscribeOptions {
        TranscribeOptions {
            want_segments: matches!(self, OutputMode::Subtitles),
            want_speakers: matches!(self, OutputMode::Interview),
        }
    }
}

/// One chunk's transcript plus where that chunk starts on the source timeline.
#[derive(Debug, Clone)]
pub struct ChunkResult {
    pub start_offset_secs: f64,
    pub transcript: ChunkTranscript,
}

#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// Content of the `.txt` output.
    pub transcript: String,
    /// Cue list for the `.srt` output, subtitle mode only.
    pub cues: Option<Vec<SrtCue>>,
}

/// Merge per-chunk results, in chunk order, into the requested representation.
pub fn merge_results(
    mode: OutputMode,
    results: &[ChunkResult],
    cfg: &MergeConfig,
    progress: &dyn ProgressSink,
) -> Result<MergeOutput> {
    match mode {
        OutputMode::Plain => Ok(MergeOutput {
            transcript: merge_plain_results(results, cfg),
            cues: None,
        }),
        OutputMode::Subtitles => {
            let mut parts = Vec::with_capacity(results.len());
            for (i, r) in results.iter().enumerate() {
                let cues = chunk_cues(&r.transcript);
                if cues.is_empty() {
                    return Err(EngineError::BadResponse(format!(
                        "chunk {} yielded no subtitle cues",
                        i + 1
                    )));
                }
                parts.push((r.start_offset_secs, cues));
            }
            let cues = merge_srt(&parts, cfg);
            Ok(MergeOutput {
                transcript: srt_transcript(&cues),
                cues: Some(cues),
            })
        }
        OutputMode::Interview => {
            let mut chunks = Vec::with_capacity(results.len());
            let mut intact = true;
            for r in results {
                match entries_from_transcript(&r.transcript) {
                    Some(entries) => chunks.push(entries),
                    None => {
                        intact = false;
                        break;
                    }
                }
            }
            // Speaker attribution is all-or-nothing for a file: one chunk
            // without speaker structure degrades the whole merge.
            if intact {
                let entries = merge_interview(&chunks);
                Ok(MergeOutput {
                    transcript: format_interview(&entries),
                    cues: None,
                })
            } else {
                log::warn!("interview structure missing in at least one chunk; falling back to plain transcript");
                progress.line("warning: speaker attribution unavailable, producing plain transcript");
                Ok(MergeOutput {
                    transcript: merge_plain_results(results, cfg),
                    cues: None,
                })
            }
        }
    }
}

fn merge_plain_results(results: &[ChunkResult], cfg: &MergeConfig) -> String {
    let parts: Vec<(f64, &str)> = results
        .iter()
        .map(|r| (r.start_offset_secs, r.transcript.text.as_str()))
        .collect();
    merge_plain(&parts, cfg)
}

/// Cues for one chunk: structured segments when present, otherwise the text
/// body if it is SRT-shaped.
fn chunk_cues(transcript: &ChunkTranscript) -> Vec<SrtCue> {
    if !transcript.segments.is_empty() {
        return cues_from_segments(&transcript.segments);
    }
    if looks_like_srt(&transcript.text) {
        return parse_srt(&transcript.text);
    }
    Vec::new()
}
