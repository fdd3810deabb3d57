//! Tunable engine configuration.
//!
//! The snap window, minimum gap, dedup run bounds and duplicate window are
//! empirically chosen values; they are carried as configuration with these
//! defaults rather than hard constants.

use serde::{Deserialize, Serialize};

/// Chunk boundary planning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkPlanConfig {
    /// Preferred chunk length in seconds.
    pub target_chunk_secs: f64,
    /// Hard upper bound on chunk length.
    pub max_chunk_secs: f64,
    /// Total overlap applied around each internal boundary (half per side).
    pub overlap_secs: f64,
    /// How far a boundary may move to land in silence.
    pub silence_snap_window_secs: f64,
    /// Minimum spacing between consecutive boundaries and from either end.
    pub min_boundary_gap_secs: f64,
}

impl Default for ChunkPlanConfig {
    fn default() -> Self {
        Self {
            target_chunk_secs: 1800.0,
            max_chunk_secs: 2100.0,
            overlap_secs: 1.5,
            silence_snap_window_secs: 90.0,
            min_boundary_gap_secs: 60.0,
        }
    }
}

/// Silence analysis knobs, passed through to the media tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SilenceConfig {
    /// Noise floor in dBFS; quieter audio counts as silence.
    pub noise_floor_db: f64,
    /// Minimum silence length worth reporting, in seconds.
    pub min_silence_secs: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            noise_floor_db: -35.0,
            min_silence_secs: 0.5,
        }
    }
}

/// Overlap-zone deduplication knobs for the mergers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Shortest line run considered a cross-chunk duplicate.
    pub dedup_min_run_lines: usize,
    /// Longest line run searched for a cross-chunk duplicate.
    pub dedup_max_run_lines: usize,
    /// A cue starting within this many ms of the previous cue's end and
    /// carrying the same text is coalesced into it.
    pub srt_duplicate_window_ms: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            dedup_min_run_lines: 2,
            dedup_max_run_lines: 16,
            srt_duplicate_window_ms: 1500,
        }
    }
}

/// Retry policy for transient backend failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub plan: ChunkPlanConfig,
    pub silence: SilenceConfig,
    pub merge: MergeConfig,
    pub retry: RetryConfig,
}
