//! Error types for hub connection operations.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while managing or using a hub connection.
///
/// The type is `Clone` because a single connect cycle is shared by every
/// caller of [`AutoHubConnection::start`](crate::AutoHubConnection::start)
/// and each of them receives the same outcome.
#[derive(Error, Debug, Clone)]
pub enum HubError {
    /// Invalid input supplied to a constructor.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Every allowed attempt of a connect cycle failed.
    #[error("Connection failed after {attempts} attempts")]
    ConnectionAttemptsExhausted { attempts: u32 },

    /// Operation requires a live session.
    #[error("Not connected")]
    NotConnected,

    /// Failure reported by the underlying session.
    #[error("Session error: {0}")]
    Session(String),

    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    /// Operation timed out.
    ///
    /// Raised by [`Session`](crate::Session) implementations, e.g. for a
    /// handshake or invocation that never completed. The manager itself
    /// never produces it; a timed out start counts as a failed attempt.
    #[error("Operation timed out")]
    Timeout,

    /// The connect cycle was cancelled by `stop()`.
    #[error("Connection stopped before it was established")]
    Stopped,

    /// No tokio runtime was available to drive the connect cycle.
    #[error("No async runtime available to drive the connection")]
    NoRuntime,
}

/// Result type alias for hub connection operations.
pub type Result<T> = std::result::Result<T, HubError>;

impl From<io::Error> for HubError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl HubError {
    /// Create a new session error.
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Check if this error is recoverable (transient).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if e.kind() == io::ErrorKind::WouldBlock
                || e.kind() == io::ErrorKind::TimedOut
                || e.kind() == io::ErrorKind::Interrupted
        ) || matches!(self, Self::Timeout | Self::NotConnected)
    }
}
