//! Long-form audio transcription by chunked remote speech-to-text.
//!
//! Remote transcription services cap the duration they accept well below
//! typical recording lengths. This crate splits an audio file into
//! request-sized chunks at acoustically sensible boundaries, submits each
//! chunk independently, and losslessly reassembles the results, timestamps,
//! speaker turns and subtitle cues included, into one coherent output.

pub mod config;
pub mod error;
pub mod media;
pub mod merge;
pub mod orchestrator;
pub mod planner;
pub mod progress;
pub mod subtitle;
pub mod transcription;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use merge::OutputMode;
pub use orchestrator::{JobOutcome, JobOutput, Orchestrator};
pub use progress::ProgressSink;
