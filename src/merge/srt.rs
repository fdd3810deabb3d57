//! Subtitle cue merging across chunk boundaries.

use crate::config::MergeConfig;
use crate::subtitle::{ms_to_clock_label, SrtCue};

fn normalized(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Merge per-chunk cue lists, shifting each by its chunk's offset.
///
/// A cue repeating the previous cue's text within the duplicate window is a
/// chunk-overlap artifact: the previous cue is extended and the incoming one
/// dropped. A genuine timing overlap pushes the incoming cue forward to start
/// where the previous one ends. The result is globally time-ordered and
/// non-overlapping by construction.
pub fn merge_srt(parts: &[(f64, Vec<SrtCue>)], cfg: &MergeConfig) -> Vec<SrtCue> {
    let mut out: Vec<SrtCue> = Vec::new();
    for (offset_secs, cues) in parts {
        let shift = (offset_secs.max(0.0) * 1000.0).round() as u64;
        for cue in cues {
            let mut cue = SrtCue {
                start_ms: cue.start_ms + shift,
                end_ms: cue.end_ms + shift,
                text: cue.text.clone(),
            };
            if let Some(prev) = out.last_mut() {
                let duplicate = normalized(&cue.text) == normalized(&prev.text)
                    && cue.start_ms <= prev.end_ms.saturating_add(cfg.srt_duplicate_window_ms);
                if duplicate {
                    prev.end_ms = prev.end_ms.max(cue.end_ms);
                    continue;
                }
                if cue.start_ms < prev.end_ms {
                    let start = prev.end_ms;
                    cue.end_ms = cue.end_ms.max(start + 1);
                    cue.start_ms = start;
                }
            }
            out.push(cue);
        }
    }
    out
}

/// Derived plain-transcript view: one `[HH:MM:SS] text` line per cue,
/// skipping a cue that would repeat the previously emitted line.
pub fn srt_transcript(cues: &[SrtCue]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for cue in cues {
        let line = format!(
            "{} {}",
            ms_to_clock_label(cue.start_ms),
            cue.text.split_whitespace().collect::<Vec<_>>().join(" ")
        );
        if lines
            .last()
            .map_or(false, |prev| prev.eq_ignore_ascii_case(&line))
        {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}
