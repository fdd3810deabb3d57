//! External media tool integration: probing, silence analysis, extraction.

mod probe;
mod segment;
mod silence;

pub use probe::media_duration_secs;
pub(crate) use segment::chunk_file_name;
pub use segment::{extract_chunk, AudioChunk};
pub use silence::{detect_silences, SilenceRange};

use crate::error::{EngineError, Result};
use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Run an external tool to completion, killing it if the caller cancels.
///
/// `kill_on_drop` is the scoped kill-on-cancel handler: when the cancelled
/// branch wins the select, dropping the wait future drops the child and the
/// runtime reaps it.
pub(crate) async fn run_tool<I, S>(
    tool: &'static str,
    args: I,
    cancel: &CancellationToken,
) -> Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    let child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| EngineError::Tool {
            tool,
            message: format!("failed to launch: {}", e),
        })?;

    let output = tokio::select! {
        _ = cancel.cancelled() => return Err(EngineError::Cancelled),
        out = child.wait_with_output() => out.map_err(|e| EngineError::Tool {
            tool,
            message: e.to_string(),
        })?,
    };
    Ok(output)
}
