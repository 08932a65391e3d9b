//! Connection statistics.

use std::time::{Duration, Instant};

/// Lifecycle counters for a managed hub connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStats {
    /// Number of session start calls made.
    pub start_attempts: u64,
    /// Number of successful connections.
    pub connect_count: u64,
    /// Number of failed start calls.
    pub failure_count: u64,
    /// Number of connect cycles begun automatically after a drop.
    pub reconnect_count: u64,
    /// Number of connect cycles that used up their retry budget.
    pub exhausted_count: u64,
    /// Number of close notifications received.
    pub close_count: u64,
    /// Time of last successful connection.
    pub last_connected: Option<Instant>,
    /// Time of last close notification.
    pub last_disconnected: Option<Instant>,
    /// Time of last failed start call.
    pub last_error: Option<Instant>,
}

impl ConnectionStats {
    /// Record a session start call.
    pub fn record_attempt(&mut self) {
        self.start_attempts += 1;
    }

    /// Record a successful connection.
    pub fn record_connect(&mut self) {
        self.connect_count += 1;
        self.last_connected = Some(Instant::now());
    }

    /// Record a failed start call.
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_error = Some(Instant::now());
    }

    /// Record an automatic reconnect cycle.
    pub fn record_reconnect(&mut self) {
        self.reconnect_count += 1;
    }

    /// Record a connect cycle that ran out of attempts.
    pub fn record_exhausted(&mut self) {
        self.exhausted_count += 1;
    }

    /// Record a close notification.
    pub fn record_close(&mut self) {
        self.close_count += 1;
        self.last_disconnected = Some(Instant::now());
    }

    /// Time since the last successful connection, if it is still up.
    pub fn uptime(&self) -> Option<Duration> {
        match (self.last_connected, self.last_disconnected) {
            (Some(up), Some(down)) if down >= up => None,
            (Some(up), _) => Some(up.elapsed()),
            _ => None,
        }
    }
}
