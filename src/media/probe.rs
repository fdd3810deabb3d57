//! Stream duration probing.

use super::run_tool;
use crate::error::{EngineError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

/// Total stream duration in seconds.
///
/// Asks ffprobe first; falls back to scraping ffmpeg's `Duration: H:MM:SS.ss`
/// diagnostic line when ffprobe is missing or unhelpful.
pub async fn media_duration_secs(path: &Path, cancel: &CancellationToken) -> Result<f64> {
    match ffprobe_duration(path, cancel).await {
        Ok(secs) => return Ok(secs),
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => log::debug!("ffprobe failed for {}: {}; trying ffmpeg", path.display(), e),
    }
    ffmpeg_duration(path, cancel).await
}

async fn ffprobe_duration(path: &Path, cancel: &CancellationToken) -> Result<f64> {
    let output = run_tool(
        "ffprobe",
        [
            "-v".as_ref(),
            "error".as_ref(),
            "-show_entries".as_ref(),
            "format=duration".as_ref(),
            "-of".as_ref(),
            "default=noprint_wrappers=1:nokey=1".as_ref(),
            path.as_os_str(),
        ],
        cancel,
    )
    .await?;
    if !output.status.success() {
        return Err(EngineError::Tool {
            tool: "ffprobe",
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    let text = String::from_utf8_lossy(&output.stdout);
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .ok_or_else(|| EngineError::Probe {
            path: path.display().to_string(),
        })
}

async fn ffmpeg_duration(path: &Path, cancel: &CancellationToken) -> Result<f64> {
    let output = run_tool(
        "ffmpeg",
        ["-hide_banner".as_ref(), "-i".as_ref(), path.as_os_str()],
        cancel,
    )
    .await?;
    // ffmpeg exits non-zero without an output file; only the stderr matters.
    let stderr = String::from_utf8_lossy(&output.stderr);
    parse_duration_line(&stderr).ok_or_else(|| EngineError::Probe {
        path: path.display().to_string(),
    })
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap())
}

fn parse_duration_line(stderr: &str) -> Option<f64> {
    let caps = duration_re().captures(stderr)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    (total > 0.0).then_some(total)
}
