//! Chunk extraction via stream copy.

use super::{media_duration_secs, run_tool};
use crate::error::{EngineError, Result};
use crate::planner::PlannedRange;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// A materialized chunk file plus its mapping back to the source timeline.
///
/// `duration_secs` is the measured duration of the encoded file, not the
/// requested one: container trimming can differ by tens of milliseconds.
/// Progress reporting and the coverage check work from the measured value.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    pub audio_path: PathBuf,
    pub start_offset_secs: f64,
    pub duration_secs: f64,
}

/// Extract `range` from `source` into `dest` without re-encoding, then
/// re-probe the actual encoded duration.
pub async fn extract_chunk(
    source: &Path,
    range: PlannedRange,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<AudioChunk> {
    let start = format!("{:.3}", range.start_secs);
    let duration = format!("{:.3}", range.duration_secs);
    let output = run_tool(
        "ffmpeg",
        [
            "-hide_banner".as_ref(),
            "-loglevel".as_ref(),
            "error".as_ref(),
            "-y".as_ref(),
            "-ss".as_ref(),
            start.as_ref(),
            "-t".as_ref(),
            duration.as_ref(),
            "-i".as_ref(),
            source.as_os_str(),
            "-c".as_ref(),
            "copy".as_ref(),
            dest.as_os_str(),
        ],
        cancel,
    )
    .await?;
    if !output.status.success() {
        return Err(EngineError::Tool {
            tool: "ffmpeg",
            message: format!(
                "extraction of [{:.3}s +{:.3}s] failed: {}",
                range.start_secs,
                range.duration_secs,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let measured = media_duration_secs(dest, cancel).await?;
    log::debug!(
        "extracted {} ({:.3}s requested, {:.3}s measured)",
        dest.display(),
        range.duration_secs,
        measured
    );
    if let Some(missing) = short_by(range.duration_secs, measured) {
        log::warn!(
            "{} came out {:.1}s shorter than planned",
            dest.display(),
            missing
        );
    }
    Ok(AudioChunk {
        audio_path: dest.to_path_buf(),
        start_offset_secs: range.start_secs,
        duration_secs: measured,
    })
}

/// Stream-copy trimming is keyframe-coarse; only shortfalls beyond this are
/// worth flagging.
const DURATION_TOLERANCE_SECS: f64 = 1.0;

fn short_by(requested_secs: f64, measured_secs: f64) -> Option<f64> {
    let shortfall = requested_secs - measured_secs;
    (shortfall > DURATION_TOLERANCE_SECS).then_some(shortfall)
}

/// Chunk file name unique across concurrent runs: the source stem, the chunk
/// index, and a run-scoped id.
pub(crate) fn chunk_file_name(source: &Path, run_id: &str, index: usize) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    let ext = source
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mka".to_string());
    format!("{}.chunk{:03}-{}.{}", stem, index + 1, run_id, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_chunks_measurably_shorter_than_planned() {
        assert!(short_by(1800.0, 1799.8).is_none());
        assert!(short_by(1800.0, 1801.5).is_none());
        assert_eq!(short_by(1800.0, 1700.0), Some(100.0));
    }

    #[test]
    fn chunk_names_embed_index_and_run_id() {
        let name = chunk_file_name(Path::new("/tmp/interview.mp3"), "a1b2c3d4", 0);
        assert_eq!(name, "interview.chunk001-a1b2c3d4.mp3");
        let other = chunk_file_name(Path::new("/tmp/interview.mp3"), "ffffffff", 11);
        assert_eq!(other, "interview.chunk012-ffffffff.mp3");
        assert_ne!(name, other);
    }
}
