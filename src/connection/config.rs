//! Connection lifecycle configuration types.

use std::time::Duration;

use crate::types::LogLevel;

/// Default delay between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(5000);

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_CONNECTION_ATTEMPTS: u32 = 5;

/// Connection configuration.
///
/// Values are not validated: whatever is supplied is used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Logging level handed to the session factory.
    pub log_level: LogLevel,
    /// Fixed delay between a failed attempt and the next one.
    pub retry_interval: Duration,
    /// Retries allowed after the initial attempt of a connect cycle.
    pub max_connection_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Error,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            max_connection_attempts: DEFAULT_MAX_CONNECTION_ATTEMPTS,
        }
    }
}

impl ConnectionConfig {
    /// Set the session logging level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the delay between connection attempts.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set the number of retries after the initial attempt.
    pub fn with_max_connection_attempts(mut self, attempts: u32) -> Self {
        self.max_connection_attempts = attempts;
        self
    }

    /// Check if another attempt should follow failed attempt `attempt` (0-indexed).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_connection_attempts
    }

    /// Upper bound on session start calls in one connect cycle.
    pub fn total_attempts(&self) -> u32 {
        self.max_connection_attempts.saturating_add(1)
    }
}

/// Partial configuration: every field left as `None` falls back to the
/// corresponding [`ConnectionConfig::default`] value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Logging level override.
    pub log_level: Option<LogLevel>,
    /// Retry interval override.
    pub retry_interval: Option<Duration>,
    /// Retry budget override.
    pub max_connection_attempts: Option<u32>,
}

impl From<ConnectionOptions> for ConnectionConfig {
    fn from(options: ConnectionOptions) -> Self {
        let defaults = ConnectionConfig::default();
        Self {
            log_level: options.log_level.unwrap_or(defaults.log_level),
            retry_interval: options.retry_interval.unwrap_or(defaults.retry_interval),
            max_connection_attempts: options
                .max_connection_attempts
                .unwrap_or(defaults.max_connection_attempts),
        }
    }
}
