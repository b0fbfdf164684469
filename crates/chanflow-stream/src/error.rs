//! Error types for chanflow-stream operations.

use thiserror::Error;

/// Errors that can occur in stream and scheduler operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The channel has been closed.
    #[error("channel is closed")]
    Closed,

    /// The scheduler worker has been shut down.
    #[error("scheduler has been shut down")]
    ShutDown,

    /// The scheduler worker task terminated abnormally.
    #[error("scheduler worker failed: {0}")]
    WorkerFailed(String),
}

impl StreamError {
    /// Returns `true` if this error indicates the channel is permanently unusable.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::ShutDown)
    }
}
