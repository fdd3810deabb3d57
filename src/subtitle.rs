//! SRT (SubRip) cue model, writer and parser.

use crate::error::Result;
use crate::transcription::Segment;
use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;

/// One timed subtitle entry. Every cue list at rest is ordered by `start_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtCue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

pub fn ms_to_srt_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// `[HH:MM:SS]` label used by the derived transcript view.
pub fn ms_to_clock_label(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    format!("[{:02}:{:02}:{:02}]", hours, mins, secs)
}

pub fn format_srt(cues: &[SrtCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            ms_to_srt_time(cue.start_ms),
            ms_to_srt_time(cue.end_ms),
            cue.text
        ));
    }
    out
}

pub fn write_srt(path: &Path, cues: &[SrtCue]) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(format_srt(cues).as_bytes())?;
    Ok(())
}

fn time_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})\s*-->\s*(\d{1,2}):(\d{2}):(\d{2})[,.](\d{1,3})",
        )
        .unwrap()
    })
}

fn parse_time_pair(line: &str) -> Option<(u64, u64)> {
    let caps = time_line_re().captures(line)?;
    let part = |i: usize| caps[i].parse::<u64>().ok();
    let ms = |h: u64, m: u64, s: u64, f: u64| h * 3_600_000 + m * 60_000 + s * 1_000 + f;
    Some((
        ms(part(1)?, part(2)?, part(3)?, part(4)?),
        ms(part(5)?, part(6)?, part(7)?, part(8)?),
    ))
}

/// Whether a text blob looks like an SRT document.
pub fn looks_like_srt(text: &str) -> bool {
    text.lines().take(50).any(|l| time_line_re().is_match(l))
}

/// Parse SRT-shaped text into cues.
///
/// Lenient on purpose: indices are ignored, `.` is accepted for `,` in
/// timestamps, and malformed blocks are skipped.
pub fn parse_srt(text: &str) -> Vec<SrtCue> {
    let mut cues = Vec::new();
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        let Some((start_ms, end_ms)) = parse_time_pair(line) else {
            continue;
        };
        let mut body = Vec::new();
        while let Some(&next) = lines.peek() {
            if next.trim().is_empty() || parse_time_pair(next).is_some() {
                break;
            }
            body.push(lines.next().unwrap_or_default().trim());
        }
        let text = body.join(" ").trim().to_string();
        if !text.is_empty() && end_ms > start_ms {
            cues.push(SrtCue {
                start_ms,
                end_ms,
                text,
            });
        }
    }
    cues
}

/// Convert normalized segments (chunk-local seconds) into cues.
pub fn cues_from_segments(segments: &[Segment]) -> Vec<SrtCue> {
    segments
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .map(|s| {
            let start_ms = (s.start_secs.max(0.0) * 1000.0).round() as u64;
            let end_ms = (s.end_secs.max(0.0) * 1000.0).round() as u64;
            SrtCue {
                start_ms,
                end_ms: end_ms.max(start_ms + 1),
                text: s.text.trim().to_string(),
            }
        })
        .collect()
}
