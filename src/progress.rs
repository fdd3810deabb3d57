//! Progress reporting for long-running jobs.
//!
//! The engine emits free-text progress lines through an injected sink and
//! never assumes a particular destination.

use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;

pub trait ProgressSink: Send + Sync {
    fn line(&self, message: &str);
}

/// Forwards progress lines to the `log` facade.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn line(&self, message: &str) {
        log::info!("{}", message);
    }
}

/// Forwards progress lines over an unbounded channel, e.g. to a UI.
pub struct ChannelSink(pub UnboundedSender<String>);

impl ProgressSink for ChannelSink {
    fn line(&self, message: &str) {
        let _ = self.0.send(message.to_string());
    }
}

/// Buffers progress lines in memory. Mainly for tests.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ProgressSink for MemorySink {
    fn line(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}
