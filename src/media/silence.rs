//! Silence analysis via the media tool's `silencedetect` filter.

use super::run_tool;
use crate::config::SilenceConfig;
use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::OnceLock;
use tokio_util::sync::CancellationToken;

/// Ranges closer than this are considered touching and get merged.
const MERGE_EPSILON_SECS: f64 = 0.01;

/// A detected low-energy interval of the source audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceRange {
    pub start_secs: f64,
    pub end_secs: f64,
}

impl SilenceRange {
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// Detect low-energy ranges in `path`.
///
/// Failure of the tool is not fatal: the caller gets an empty list and a
/// warning, and chunk planning proceeds unsnapped. Cancellation is the one
/// exception and propagates as an error.
pub async fn detect_silences(
    path: &Path,
    cfg: &SilenceConfig,
    cancel: &CancellationToken,
) -> crate::error::Result<Vec<SilenceRange>> {
    let filter = format!(
        "silencedetect=noise={}dB:d={}",
        cfg.noise_floor_db, cfg.min_silence_secs
    );
    let result = run_tool(
        "ffmpeg",
        [
            "-hide_banner".as_ref(),
            "-nostats".as_ref(),
            "-i".as_ref(),
            path.as_os_str(),
            "-af".as_ref(),
            filter.as_ref(),
            "-f".as_ref(),
            "null".as_ref(),
            "-".as_ref(),
        ],
        cancel,
    )
    .await;
    let output = match result {
        Ok(out) => out,
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            log::warn!("silence analysis unavailable ({}); chunking without snapping", e);
            return Ok(Vec::new());
        }
    };
    if !output.status.success() {
        log::warn!(
            "silence analysis failed for {}; chunking without snapping",
            path.display()
        );
        return Ok(Vec::new());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Ok(parse_silence_output(&stderr))
}

fn start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"silence_start:\s*(-?\d+(?:\.\d+)?)").unwrap())
}

fn end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"silence_end:\s*(\d+(?:\.\d+)?)(?:\s*\|\s*silence_duration:\s*(\d+(?:\.\d+)?))?")
            .unwrap()
    })
}

/// Parse paired `silence_start` / `silence_end` markers from diagnostic text.
///
/// Tolerates truncated output and missing start markers: a lone end marker
/// with a duration infers its start as `end - duration`.
pub fn parse_silence_output(raw: &str) -> Vec<SilenceRange> {
    let mut ranges = Vec::new();
    let mut pending_start: Option<f64> = None;
    for line in raw.lines() {
        if let Some(caps) = start_re().captures(line) {
            pending_start = caps[1].parse::<f64>().ok().map(|s| s.max(0.0));
            continue;
        }
        if let Some(caps) = end_re().captures(line) {
            let end: f64 = match caps[1].parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            let duration: f64 = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0.0);
            let start = match pending_start.take() {
                Some(s) => s,
                None => (end - duration).max(0.0),
            };
            if end > start {
                ranges.push(SilenceRange {
                    start_secs: start,
                    end_secs: end,
                });
            }
        }
    }
    merge_ranges(ranges)
}

fn merge_ranges(mut ranges: Vec<SilenceRange>) -> Vec<SilenceRange> {
    ranges.sort_by(|a, b| {
        a.start_secs
            .partial_cmp(&b.start_secs)
            .unwrap_or(Ordering::Equal)
    });
    let mut merged: Vec<SilenceRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(last) = merged.last_mut() {
            if range.start_secs <= last.end_secs + MERGE_EPSILON_SECS {
                last.end_secs = last.end_secs.max(range.end_secs);
                continue;
            }
        }
        merged.push(range);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paired_markers() {
        let raw = "\
[silencedetect @ 0x55d] silence_start: 12.5
[silencedetect @ 0x55d] silence_end: 14.25 | silence_duration: 1.75
[silencedetect @ 0x55d] silence_start: 300
[silencedetect @ 0x55d] silence_end: 302.5 | silence_duration: 2.5
";
        let ranges = parse_silence_output(raw);
        assert_eq!(
            ranges,
            vec![
                SilenceRange { start_secs: 12.5, end_secs: 14.25 },
                SilenceRange { start_secs: 300.0, end_secs: 302.5 },
            ]
        );
    }

    #[test]
    fn infers_missing_start_from_duration() {
        let raw = "[silencedetect @ 0x1] silence_end: 20.0 | silence_duration: 5.0\n";
        let ranges = parse_silence_output(raw);
        assert_eq!(ranges, vec![SilenceRange { start_secs: 15.0, end_secs: 20.0 }]);
    }

    #[test]
    fn tolerates_truncated_trailing_start() {
        let raw = "\
[silencedetect @ 0x1] silence_start: 10.0
[silencedetect @ 0x1] silence_end: 11.0 | silence_duration: 1.0
[silencedetect @ 0x1] silence_start: 50.0
";
        let ranges = parse_silence_output(raw);
        assert_eq!(ranges, vec![SilenceRange { start_secs: 10.0, end_secs: 11.0 }]);
    }

    #[test]
    fn merges_overlapping_and_touching_ranges() {
        let raw = "\
silence_start: 10.0
silence_end: 12.0 | silence_duration: 2.0
silence_start: 11.5
silence_end: 13.0 | silence_duration: 1.5
silence_start: 13.005
silence_end: 14.0 | silence_duration: 0.995
silence_start: 20.0
silence_end: 21.0 | silence_duration: 1.0
";
        let ranges = parse_silence_output(raw);
        assert_eq!(
            ranges,
            vec![
                SilenceRange { start_secs: 10.0, end_secs: 14.0 },
                SilenceRange { start_secs: 20.0, end_secs: 21.0 },
            ]
        );
    }

    #[test]
    fn empty_output_yields_no_ranges() {
        assert!(parse_silence_output("").is_empty());
        assert!(parse_silence_output("frame=1 fps=0").is_empty());
    }
}
