//! Flaky hub example.
//!
//! This example wraps an in-memory session that refuses its first two start
//! calls and later drops the connection, showing retries and the automatic
//! reconnect.
//!
//! Run: cargo run --example flaky_hub
//! Set RUST_LOG=autohub_rs=debug to see every attempt.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use autohub_rs::{
    AutoHubConnection, CloseHandler, ConnectionConfig, HubConnectionState, HubError, HubStream,
    LogLevel, MethodHandler, Result, Session,
};
use bytes::Bytes;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

const HUB_ADDR: &str = "memory://chat-hub";
const REFUSED_STARTS: usize = 2;

/// A session that only accepts the connection on its third start call.
#[derive(Default)]
struct FlakySession {
    starts: AtomicUsize,
    state: Mutex<HubConnectionState>,
    on_close: Mutex<Option<CloseHandler>>,
}

impl FlakySession {
    fn sever(&self) {
        *self.state.lock().unwrap() = HubConnectionState::Disconnected;
        let handler = self.on_close.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(Some(&HubError::session("server went away")));
        }
    }
}

#[async_trait]
impl Session for FlakySession {
    async fn start(&self) -> Result<()> {
        let n = self.starts.fetch_add(1, Ordering::SeqCst);
        if n < REFUSED_STARTS {
            return Err(HubError::session(format!("connection refused (start #{n})")));
        }
        *self.state.lock().unwrap() = HubConnectionState::Connected;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        *self.state.lock().unwrap() = HubConnectionState::Disconnected;
        let handler = self.on_close.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(None);
        }
        Ok(())
    }

    fn state(&self) -> HubConnectionState {
        *self.state.lock().unwrap()
    }

    fn on_close(&self, handler: CloseHandler) {
        *self.on_close.lock().unwrap() = Some(handler);
    }

    async fn invoke(&self, method: &str, args: Bytes) -> Result<Bytes> {
        if !self.state().is_connected() {
            return Err(HubError::NotConnected);
        }
        Ok(Bytes::from(format!(
            "{method} -> {}",
            String::from_utf8_lossy(&args)
        )))
    }

    async fn send(&self, _method: &str, _args: Bytes) -> Result<()> {
        Ok(())
    }

    fn stream(&self, _method: &str, _args: Bytes) -> Result<HubStream> {
        let ticks = (1..=3).map(|i| Ok::<_, HubError>(Bytes::from(format!("tick {i}"))));
        Ok(futures::stream::iter(ticks).boxed())
    }

    fn on(&self, _method: &str, _handler: MethodHandler) {}

    fn off(&self, _method: &str, _handler: Option<&MethodHandler>) {}
}

fn init_logging(level: LogLevel) {
    let default = level
        .as_tracing_level()
        .map_or("off".to_string(), |l| l.to_string().to_lowercase());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = ConnectionConfig::default()
        .with_log_level(LogLevel::Information)
        .with_retry_interval(Duration::from_millis(250))
        .with_max_connection_attempts(3);
    init_logging(config.log_level);

    let session = Arc::new(FlakySession::default());
    let handle = session.clone();
    let factory = move |_address: &str, _level: LogLevel| -> Result<Arc<dyn Session>> {
        Ok(handle.clone() as Arc<dyn Session>)
    };

    let hub = AutoHubConnection::new(HUB_ADDR, Some(config), factory)?;
    hub.on_close(|error| match error {
        Some(err) => println!("Connection closed: {err}"),
        None => println!("Connection closed"),
    });

    println!("Connecting to {HUB_ADDR}...");
    hub.start().await?;
    println!("Connected after {} start calls", session.starts.load(Ordering::SeqCst));

    let reply = hub.invoke("Echo", Bytes::from_static(b"hello")).await?;
    println!("Reply: {}", String::from_utf8_lossy(&reply));

    println!("\n--- Dropping the connection ---");
    session.sever();
    hub.start().await?;
    println!("State after reconnect: {:?}", hub.state());

    let mut ticks = hub.stream("Ticks", Bytes::new())?;
    while let Some(tick) = ticks.next().await {
        println!("Stream item: {}", String::from_utf8_lossy(&tick?));
    }

    hub.stop().await?;
    println!("\nStopped. Stats: {:?}", hub.stats());

    Ok(())
}
