//! Plain timestamped transcript merging with overlap-zone deduplication.

use crate::config::MergeConfig;
use regex::{Captures, Regex};
use std::sync::OnceLock;

fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(\d{1,2}):(\d{2})(?::(\d{2}))?\]").unwrap())
}

/// Shift every inline `[MM:SS]` / `[HH:MM:SS]` token by `offset_secs`.
///
/// This is text surgery on purpose: bracket stamps from the prompt backend
/// are never parsed into segments.
pub fn shift_bracket_timestamps(text: &str, offset_secs: f64) -> String {
    let offset = offset_secs.max(0.0).round() as u64;
    if offset == 0 {
        return text.to_string();
    }
    bracket_re()
        .replace_all(text, |caps: &Captures| {
            let first: u64 = caps[1].parse().unwrap_or(0);
            let second: u64 = caps[2].parse().unwrap_or(0);
            let total = match caps.get(3) {
                Some(secs) => first * 3600 + second * 60 + secs.as_str().parse().unwrap_or(0),
                None => first * 60 + second,
            } + offset;
            let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
            if h > 0 {
                format!("[{:02}:{:02}:{:02}]", h, m, s)
            } else {
                format!("[{:02}:{:02}]", m, s)
            }
        })
        .into_owned()
}

fn chunk_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Merge per-chunk texts in chunk order.
///
/// Adjacent chunks overlap in audio and therefore in transcribed content, so
/// between consecutive chunks the longest run of trailing merged lines that
/// case-insensitively matches the next chunk's leading lines is dropped from
/// the incoming chunk. When no run matches, a single exact duplicate of the
/// last merged line is still dropped as a minimal fallback.
pub fn merge_plain(parts: &[(f64, &str)], cfg: &MergeConfig) -> String {
    let mut merged: Vec<String> = Vec::new();
    for (offset_secs, text) in parts {
        let shifted = shift_bracket_timestamps(text, *offset_secs);
        let lines = chunk_lines(&shifted);
        if merged.is_empty() {
            merged = lines;
            continue;
        }
        let drop = overlap_run(&merged, &lines, cfg);
        merged.extend(lines.into_iter().skip(drop));
    }
    merged.join("\n")
}

fn overlap_run(merged: &[String], incoming: &[String], cfg: &MergeConfig) -> usize {
    let max_run = cfg
        .dedup_max_run_lines
        .min(merged.len())
        .min(incoming.len());
    let min_run = cfg.dedup_min_run_lines.max(1);
    for run in (min_run..=max_run).rev() {
        let tail = &merged[merged.len() - run..];
        if tail
            .iter()
            .zip(&incoming[..run])
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
        {
            return run;
        }
    }
    // The run match is case-insensitive; the single-line fallback is exact.
    match (merged.last(), incoming.first()) {
        (Some(last), Some(first)) if last == first => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> MergeConfig {
        MergeConfig::default()
    }

    #[test]
    fn shifts_short_and_long_bracket_stamps() {
        let text = "[00:05] hello\n[59:30] nearly there\n[01:02:03] deep in";
        let shifted = shift_bracket_timestamps(text, 1800.0);
        assert_eq!(
            shifted,
            "[30:05] hello\n[01:29:30] nearly there\n[01:32:03] deep in"
        );
    }

    #[test]
    fn zero_offset_leaves_text_untouched() {
        let text = "[00:05] hello";
        assert_eq!(shift_bracket_timestamps(text, 0.0), text);
    }

    #[test]
    fn merges_overlapping_chunks_dropping_duplicate_runs() {
        let parts = [
            (0.0, "A\nB\nC\nD"),
            (0.0, "C\nD\nE\nF"),
            (0.0, "E\nF\nG"),
        ];
        assert_eq!(merge_plain(&parts, &cfg()), "A\nB\nC\nD\nE\nF\nG");
    }

    #[test]
    fn run_match_is_case_insensitive() {
        let parts = [(0.0, "one\nTwo\nThree"), (0.0, "two\nthree\nfour")];
        assert_eq!(merge_plain(&parts, &cfg()), "one\nTwo\nThree\nfour");
    }

    #[test]
    fn falls_back_to_single_duplicate_last_line() {
        let parts = [(0.0, "alpha\nbeta"), (0.0, "beta\ngamma")];
        assert_eq!(merge_plain(&parts, &cfg()), "alpha\nbeta\ngamma");
    }

    #[test]
    fn single_line_fallback_requires_exact_match() {
        let parts = [(0.0, "alpha\nBeta"), (0.0, "beta\ngamma")];
        assert_eq!(merge_plain(&parts, &cfg()), "alpha\nBeta\nbeta\ngamma");
    }

    #[test]
    fn disjoint_chunks_concatenate() {
        let parts = [(0.0, "alpha\nbeta"), (0.0, "gamma\ndelta")];
        assert_eq!(merge_plain(&parts, &cfg()), "alpha\nbeta\ngamma\ndelta");
    }

    #[test]
    fn merge_is_idempotent_over_a_repeated_chunk() {
        let parts = [(0.0, "A\nB\nC\nD"), (0.0, "C\nD\nE\nF")];
        let once = merge_plain(&parts, &cfg());
        let again = merge_plain(&[(0.0, once.as_str()), (0.0, "C\nD\nE\nF")], &cfg());
        assert_eq!(once, again);
    }

    #[test]
    fn shifted_stamps_align_across_the_overlap() {
        // Chunk 2 starts at 60 s; its local [00:10] is the same moment as
        // chunk 1's [01:10], so the run dedup sees identical lines.
        let parts = [
            (0.0, "[01:00] one\n[01:10] two\n[01:20] three"),
            (60.0, "[00:10] two\n[00:20] three\n[00:30] four"),
        ];
        assert_eq!(
            merge_plain(&parts, &cfg()),
            "[01:00] one\n[01:10] two\n[01:20] three\n[01:30] four"
        );
    }
}
