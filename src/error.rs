//! Engine error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller's cancellation token fired. Cleaned up, never logged as an error.
    #[error("operation cancelled")]
    Cancelled,

    /// External media tool missing or erroring. Fatal for probing and
    /// segmenting; silence analysis catches this and degrades instead.
    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    #[error("could not read media duration of {path}")]
    Probe { path: String },

    #[error("backend still unavailable after {attempts} attempts (HTTP {status}): {body}")]
    RemoteTransient {
        status: u16,
        attempts: u32,
        body: String,
    },

    #[error("backend rejected request (HTTP {status}): {body}")]
    RemotePermanent { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed or unusable backend response for one chunk.
    #[error("unusable backend response: {0}")]
    BadResponse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled)
    }
}
