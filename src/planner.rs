//! Chunk boundary planning: equal split, silence snapping, overlap.

use crate::config::ChunkPlanConfig;
use crate::media::SilenceRange;

/// One slice of the source timeline in seconds.
///
/// Logical ranges are contiguous and cover `[0, total]` exactly; physical
/// ranges (after [`plan_chunks`]) additionally overlap their neighbours by
/// about `overlap_secs` at internal boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedRange {
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl PlannedRange {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

fn chunk_count(total_secs: f64, cfg: &ChunkPlanConfig) -> usize {
    let by_target = (total_secs / cfg.target_chunk_secs).round() as usize;
    let by_max = (total_secs / cfg.max_chunk_secs).ceil() as usize;
    let mut n = by_target.max(by_max).max(1);
    while total_secs / n as f64 > cfg.max_chunk_secs {
        n += 1;
    }
    n
}

/// Move each interior boundary into nearby silence, left to right, so every
/// boundary's legal interval is computed against the previously chosen one.
/// A boundary with no silence candidate is clamped into its legal interval,
/// which keeps consecutive boundaries at least `min_boundary_gap_secs` apart
/// even when an earlier snap moved toward this one.
fn snap_boundaries(
    boundaries: &[f64],
    total_secs: f64,
    silences: &[SilenceRange],
    cfg: &ChunkPlanConfig,
) -> Vec<f64> {
    let mut snapped = Vec::with_capacity(boundaries.len());
    let mut prev = 0.0;
    for &target in boundaries {
        let legal_lo = (prev + cfg.min_boundary_gap_secs).max(target - cfg.silence_snap_window_secs);
        let legal_hi =
            (total_secs - cfg.min_boundary_gap_secs).min(target + cfg.silence_snap_window_secs);
        let mut best: Option<f64> = None;
        if legal_lo <= legal_hi {
            for silence in silences {
                if silence.end_secs < legal_lo || silence.start_secs > legal_hi {
                    continue;
                }
                let lo = silence.start_secs.max(legal_lo);
                let hi = silence.end_secs.min(legal_hi);
                if lo > hi {
                    continue;
                }
                let candidate = target.clamp(lo, hi);
                let closer = match best {
                    Some(b) => (candidate - target).abs() < (b - target).abs(),
                    None => true,
                };
                if closer {
                    best = Some(candidate);
                }
            }
        }
        let chosen = best.unwrap_or_else(|| {
            if legal_lo <= legal_hi {
                target.clamp(legal_lo, legal_hi)
            } else {
                legal_lo.min(total_secs - cfg.min_boundary_gap_secs)
            }
        });
        snapped.push(chosen);
        prev = chosen;
    }
    snapped
}

fn ranges_from_boundaries(boundaries: &[f64], total_secs: f64) -> Vec<PlannedRange> {
    let mut ranges = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0.0;
    for &b in boundaries {
        ranges.push(PlannedRange {
            start_secs: start,
            duration_secs: b - start,
        });
        start = b;
    }
    ranges.push(PlannedRange {
        start_secs: start,
        duration_secs: total_secs - start,
    });
    ranges
}

/// Logical (non-overlapping) ranges after silence snapping.
pub fn plan_logical_ranges(
    total_secs: f64,
    silences: &[SilenceRange],
    cfg: &ChunkPlanConfig,
) -> Vec<PlannedRange> {
    let n = chunk_count(total_secs, cfg);
    let initial: Vec<f64> = (1..n).map(|i| total_secs * i as f64 / n as f64).collect();
    let boundaries = if silences.is_empty() {
        log::warn!("no silence data; chunk boundaries will not be snapped (degraded mode)");
        initial
    } else {
        snap_boundaries(&initial, total_secs, silences, cfg)
    };
    ranges_from_boundaries(&boundaries, total_secs)
}

/// Physical ranges handed to the segmenter: the logical ranges with half the
/// configured overlap added on each internal side, clamped to `[0, total]`.
pub fn plan_chunks(
    total_secs: f64,
    silences: &[SilenceRange],
    cfg: &ChunkPlanConfig,
) -> Vec<PlannedRange> {
    let logical = plan_logical_ranges(total_secs, silences, cfg);
    let half = cfg.overlap_secs / 2.0;
    let last = logical.len() - 1;
    logical
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let start = if i == 0 {
                r.start_secs
            } else {
                (r.start_secs - half).max(0.0)
            };
            let end = if i == last {
                r.end_secs()
            } else {
                (r.end_secs() + half).min(total_secs)
            };
            PlannedRange {
                start_secs: start,
                duration_secs: end - start,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ChunkPlanConfig {
        ChunkPlanConfig::default()
    }

    fn silence(start: f64, end: f64) -> SilenceRange {
        SilenceRange {
            start_secs: start,
            end_secs: end,
        }
    }

    #[test]
    fn two_hours_make_four_chunks() {
        let ranges = plan_logical_ranges(7200.0, &[], &cfg());
        assert_eq!(ranges.len(), 4);
        for r in &ranges {
            assert!((r.duration_secs - 1800.0).abs() < 1e-9);
        }
    }

    #[test]
    fn short_input_is_one_chunk() {
        let ranges = plan_logical_ranges(300.0, &[], &cfg());
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start_secs, 0.0);
        assert_eq!(ranges[0].duration_secs, 300.0);
    }

    #[test]
    fn no_chunk_exceeds_max() {
        for total in [1900.0, 4200.0, 6301.0, 10000.0] {
            for r in plan_logical_ranges(total, &[], &cfg()) {
                assert!(r.duration_secs <= cfg().max_chunk_secs + 1e-9);
            }
        }
    }

    #[test]
    fn logical_ranges_cover_timeline_exactly() {
        for total in [61.0, 1800.0, 5400.0, 7201.5, 12345.6] {
            let ranges = plan_logical_ranges(total, &[], &cfg());
            assert!((ranges[0].start_secs - 0.0).abs() < 1e-9);
            for pair in ranges.windows(2) {
                assert!((pair[0].end_secs() - pair[1].start_secs).abs() < 1e-9);
            }
            let sum: f64 = ranges.iter().map(|r| r.duration_secs).sum();
            assert!((sum - total).abs() < 1e-6);
            for r in &ranges {
                assert!(r.duration_secs > 0.0);
            }
        }
    }

    #[test]
    fn boundary_snaps_into_silence() {
        // Boundaries for 7200 s sit at 1800/3600/5400. Give the first one a
        // silence slightly to its left and leave the others dry.
        let silences = [silence(1770.0, 1775.0)];
        let ranges = plan_logical_ranges(7200.0, &silences, &cfg());
        assert_eq!(ranges.len(), 4);
        let b: Vec<f64> = ranges[..3].iter().map(|r| r.end_secs()).collect();
        assert!((b[0] - 1775.0).abs() < 1e-9);
        assert!((b[1] - 3600.0).abs() < 1e-9);
        assert!((b[2] - 5400.0).abs() < 1e-9);
    }

    #[test]
    fn snapping_picks_point_nearest_target() {
        let cfg = cfg();
        // One boundary at 1800 for a 3600 s file of 2 chunks.
        let silences = [silence(1750.0, 1760.0), silence(1795.0, 1803.0)];
        let ranges = plan_logical_ranges(3600.0, &silences, &cfg);
        assert_eq!(ranges.len(), 2);
        // Target 1800 lies inside the second silence, so it stays put.
        assert!((ranges[0].end_secs() - 1800.0).abs() < 1e-9);

        let silences = [silence(1750.0, 1760.0)];
        let ranges = plan_logical_ranges(3600.0, &silences, &cfg);
        // Nearest point of [1750, 1760] to 1800 is its right edge.
        assert!((ranges[0].end_secs() - 1760.0).abs() < 1e-9);
    }

    #[test]
    fn silence_outside_window_is_ignored() {
        let silences = [silence(100.0, 105.0), silence(3500.0, 3505.0)];
        let ranges = plan_logical_ranges(3600.0, &silences, &cfg());
        assert!((ranges[0].end_secs() - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn snapped_boundaries_keep_min_gap_and_order() {
        let cfg = ChunkPlanConfig {
            target_chunk_secs: 100.0,
            max_chunk_secs: 120.0,
            min_boundary_gap_secs: 60.0,
            silence_snap_window_secs: 90.0,
            ..ChunkPlanConfig::default()
        };
        // One long silence spanning two target boundaries: the first snaps
        // right into it, the second must stay a full gap away.
        let silences = vec![silence(140.0, 260.0)];
        let ranges = plan_logical_ranges(600.0, &silences, &cfg);
        let boundaries: Vec<f64> = ranges[..ranges.len() - 1].iter().map(|r| r.end_secs()).collect();
        for pair in boundaries.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] >= cfg.min_boundary_gap_secs - 1e-9);
        }
        if let Some(&first) = boundaries.first() {
            assert!(first >= cfg.min_boundary_gap_secs - 1e-9);
        }
        if let Some(&last) = boundaries.last() {
            assert!(last <= 600.0 - cfg.min_boundary_gap_secs + 1e-9);
        }
    }

    #[test]
    fn dry_boundary_after_a_snap_keeps_min_gap() {
        let cfg = ChunkPlanConfig {
            target_chunk_secs: 100.0,
            max_chunk_secs: 120.0,
            min_boundary_gap_secs: 60.0,
            silence_snap_window_secs: 90.0,
            ..ChunkPlanConfig::default()
        };
        // Boundary 1 snaps forward into [185, 195]; boundary 2 finds no
        // silence and must not fall back to its raw target of 200.
        let silences = [silence(185.0, 195.0)];
        let ranges = plan_logical_ranges(600.0, &silences, &cfg);
        let boundaries: Vec<f64> =
            ranges[..ranges.len() - 1].iter().map(|r| r.end_secs()).collect();
        assert!((boundaries[0] - 185.0).abs() < 1e-9);
        assert!((boundaries[1] - 245.0).abs() < 1e-9);
        for pair in boundaries.windows(2) {
            assert!(pair[1] - pair[0] >= cfg.min_boundary_gap_secs - 1e-9);
        }
    }

    #[test]
    fn overlap_extends_internal_edges_only() {
        let cfg = cfg();
        let logical = plan_logical_ranges(7200.0, &[], &cfg);
        let physical = plan_chunks(7200.0, &[], &cfg);
        assert_eq!(physical.len(), logical.len());
        for (i, (l, p)) in logical.iter().zip(physical.iter()).enumerate() {
            assert!(p.duration_secs >= l.duration_secs - 1e-9);
            if i == 0 {
                assert_eq!(p.start_secs, 0.0);
            }
            if i == physical.len() - 1 {
                assert!((p.end_secs() - 7200.0).abs() < 1e-9);
            }
        }
        for pair in physical.windows(2) {
            let overlap = pair[0].end_secs() - pair[1].start_secs;
            assert!(overlap > 0.0);
            assert!(overlap <= cfg.overlap_secs + 1e-9);
        }
    }
}
