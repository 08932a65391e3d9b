//! Hub-level enumerations shared by sessions and the connection manager.

/// Logging verbosity handed to the session factory.
///
/// Ordered from most to least verbose; `None` disables logging entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    /// Very low severity diagnostics.
    Trace,
    /// Debugging information.
    Debug,
    /// Informational messages.
    Information,
    /// Something unexpected that does not stop the session.
    Warning,
    /// Errors (the default).
    #[default]
    Error,
    /// Failures that make the session unusable.
    Critical,
    /// No logging at all.
    None,
}

impl LogLevel {
    /// Map onto the closest `tracing` level, or `None` when logging is off.
    pub fn as_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Trace => Some(tracing::Level::TRACE),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Information => Some(tracing::Level::INFO),
            LogLevel::Warning => Some(tracing::Level::WARN),
            LogLevel::Error | LogLevel::Critical => Some(tracing::Level::ERROR),
            LogLevel::None => None,
        }
    }
}

/// Connectivity state reported by a hub session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HubConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Currently attempting to connect.
    Connecting,
    /// Connected and ready.
    Connected,
    /// Connection is being shut down.
    Disconnecting,
    /// Connection is being re-established after a drop.
    Reconnecting,
}

impl HubConnectionState {
    /// Check if the session is usable.
    pub fn is_connected(&self) -> bool {
        *self == HubConnectionState::Connected
    }

    /// Check if a connection attempt is in progress.
    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            HubConnectionState::Connecting | HubConnectionState::Reconnecting
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state() {
        assert!(HubConnectionState::Connected.is_connected());
        assert!(!HubConnectionState::Disconnected.is_connected());
        assert!(HubConnectionState::Connecting.is_connecting());
        assert!(HubConnectionState::Reconnecting.is_connecting());
        assert!(!HubConnectionState::Disconnecting.is_connecting());
        assert_eq!(HubConnectionState::default(), HubConnectionState::Disconnected);
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::default(), LogLevel::Error);
        assert_eq!(LogLevel::Information.as_tracing_level(), Some(tracing::Level::INFO));
        assert_eq!(LogLevel::Critical.as_tracing_level(), Some(tracing::Level::ERROR));
        assert_eq!(LogLevel::None.as_tracing_level(), None);
        assert!(LogLevel::Trace < LogLevel::Warning);
    }
}
