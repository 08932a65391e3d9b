//! The session boundary consumed by the connection manager.
//!
//! A [`Session`] is the live, stateful hub connection: it owns the wire
//! protocol, transport negotiation and serialization. The manager only drives
//! its lifecycle and forwards calls to it. Sessions are produced by a
//! [`SessionFactory`], which is invoked once when the manager is built.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::error::{HubError, Result};
use crate::types::{HubConnectionState, LogLevel};

/// Items produced by a streaming hub method.
pub type HubStream = BoxStream<'static, Result<Bytes>>;

/// Callback invoked when a session closes, with the reason if there was one.
pub type CloseHandler = Arc<dyn Fn(Option<&HubError>) + Send + Sync>;

/// Callback invoked when the server calls a client-side hub method.
///
/// Handlers are compared by pointer identity when removed with
/// [`Session::off`].
pub type MethodHandler = Arc<dyn Fn(Bytes) + Send + Sync>;

/// A persistent, bidirectional hub session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Establish the connection.
    async fn start(&self) -> Result<()>;

    /// Tear the connection down. Raises the close notification.
    async fn stop(&self) -> Result<()>;

    /// Current connectivity state.
    fn state(&self) -> HubConnectionState;

    /// Register the close notification handler.
    ///
    /// The handler may be called from any thread, including synchronously
    /// from within this call when the session is already closed.
    fn on_close(&self, handler: CloseHandler);

    /// Invoke a hub method and wait for its result.
    async fn invoke(&self, method: &str, args: Bytes) -> Result<Bytes>;

    /// Invoke a hub method without waiting for a response.
    async fn send(&self, method: &str, args: Bytes) -> Result<()>;

    /// Invoke a streaming hub method.
    fn stream(&self, method: &str, args: Bytes) -> Result<HubStream>;

    /// Register a handler for a client-side method.
    fn on(&self, method: &str, handler: MethodHandler);

    /// Remove one handler, or all handlers when `handler` is `None`.
    fn off(&self, method: &str, handler: Option<&MethodHandler>);
}

/// Produces fresh, not yet started sessions.
pub trait SessionFactory: Send + Sync {
    /// Build a session for `address`. Must not connect.
    fn create_session(&self, address: &str, log_level: LogLevel) -> Result<Arc<dyn Session>>;
}

impl<F> SessionFactory for F
where
    F: Fn(&str, LogLevel) -> Result<Arc<dyn Session>> + Send + Sync,
{
    fn create_session(&self, address: &str, log_level: LogLevel) -> Result<Arc<dyn Session>> {
        self(address, log_level)
    }
}
