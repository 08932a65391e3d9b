//! Auto-reconnecting lifecycle wrapper for persistent hub sessions.
//!
//! A hub session is a long-lived, bidirectional, message-based connection
//! supporting remote method invocation, streaming and server-to-client
//! callbacks. This crate hides transient failures of such a session from
//! its callers: it owns connection establishment, retries with a fixed
//! interval, coalesces concurrent start requests into one attempt, and
//! re-establishes the connection after an unexpected drop.
//!
//! The session itself (wire protocol, transport negotiation, serialization)
//! is supplied by the application through the [`Session`] and
//! [`SessionFactory`] traits.
//!
//! # Features
//!
//! - Single-flight `start()`: concurrent callers share one connect cycle
//! - Bounded retries with a fixed interval between attempts
//! - Automatic reconnect on any close not requested through `stop()`
//! - `stop()` cancels a pending retry
//! - Pass-through `invoke`, `send`, `stream`, `on` and `off`
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start()--> Connecting(0..=max) --ok--> Connected
//!                        |                          |
//!                   exhausted                     close
//!                        v                          v
//!                     Failed           stop()? --yes--> Idle
//!                                         |
//!                                         no --> Connecting(0)
//! ```

pub mod connection;
pub mod error;
pub mod session;
pub mod types;

// Re-export commonly used types at the crate root
pub use connection::{
    AutoHubConnection, ConnectionConfig, ConnectionOptions, ConnectionStats, StartFuture,
};
pub use error::{HubError, Result};
pub use session::{CloseHandler, HubStream, MethodHandler, Session, SessionFactory};
pub use types::{HubConnectionState, LogLevel};
