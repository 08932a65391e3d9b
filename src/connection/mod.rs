//! Connection lifecycle management for hub sessions.
//!
//! This module provides:
//! - An auto-reconnecting wrapper around a single hub session
//! - Single-flight start coordination with fixed-interval retries
//! - Configuration for the retry budget, retry interval and log level
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use autohub_rs::connection::{AutoHubConnection, ConnectionConfig};
//! use autohub_rs::{LogLevel, Result, Session};
//!
//! # fn build_session(address: &str, level: LogLevel) -> Result<Arc<dyn Session>> { unimplemented!() }
//! # async fn run() -> Result<()> {
//! let config = ConnectionConfig::default()
//!     .with_retry_interval(Duration::from_secs(1))
//!     .with_max_connection_attempts(3);
//!
//! let hub = AutoHubConnection::new("https://example.com/hub", Some(config), build_session)?;
//!
//! // Retries up to 3 more times, one second apart, then reconnects on its
//! // own whenever the session drops.
//! hub.start().await?;
//!
//! let reply = hub.invoke("Echo", "hello".into()).await?;
//! println!("Reply: {reply:?}");
//!
//! hub.stop().await?;
//! # Ok(())
//! # }
//! ```

mod auto_hub;
mod config;
mod state;

pub use auto_hub::{AutoHubConnection, StartFuture};
pub use config::{
    ConnectionConfig, ConnectionOptions, DEFAULT_MAX_CONNECTION_ATTEMPTS, DEFAULT_RETRY_INTERVAL,
};
pub use state::ConnectionStats;
