//! Auto-reconnecting hub connection.

use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{HubError, Result};
use crate::session::{CloseHandler, HubStream, MethodHandler, Session, SessionFactory};
use crate::types::HubConnectionState;

use super::config::ConnectionConfig;
use super::state::ConnectionStats;

/// Outcome of one connect cycle, shared by every caller of
/// [`AutoHubConnection::start`] while that cycle is current.
pub type StartFuture = Shared<BoxFuture<'static, Result<()>>>;

/// Bookkeeping for the connect cycle currently owned by the manager.
#[derive(Default)]
struct Lifecycle {
    /// Pending or settled result of the current cycle. `None` once the
    /// session closes, the user stops it, or the retry budget runs out.
    start_future: Option<StartFuture>,
    /// Aborts the retry wait of the current cycle.
    cancel: Option<CancellationToken>,
    /// Increments with every cycle.
    cycle: u64,
    /// Set by `stop()`, cleared when a new cycle begins.
    closed_by_user: bool,
    /// Increments whenever a session is created or dropped. Close
    /// notifications carrying an older value are ignored.
    session_generation: u64,
}

struct Inner {
    address: String,
    config: ConnectionConfig,
    factory: Box<dyn SessionFactory>,
    session: Mutex<Option<Arc<dyn Session>>>,
    lifecycle: Mutex<Lifecycle>,
    close_handler: Mutex<Option<CloseHandler>>,
    stats: Mutex<ConnectionStats>,
    /// Runtime that drove the last cycle, used when a close notification
    /// arrives on a thread outside any runtime.
    runtime: Mutex<Option<Handle>>,
}

/// A hub connection that retries failed starts and reconnects after drops.
///
/// One session is created up front and reused for every attempt and every
/// reconnect. Cloning the handle is cheap; all clones drive the same
/// session.
///
/// Lock order is `lifecycle`, then `session`, then `stats`. No lock is held
/// across an `.await`, nor while the factory or `Session::on_close` runs.
#[derive(Clone)]
pub struct AutoHubConnection {
    inner: Arc<Inner>,
}

impl AutoHubConnection {
    /// Create a manager for the hub at `address`.
    ///
    /// `None` uses [`ConnectionConfig::default`]; partial settings can be
    /// built from [`ConnectionOptions`](super::ConnectionOptions). The
    /// session is built immediately but not started.
    pub fn new<F>(
        address: impl Into<String>,
        config: Option<ConnectionConfig>,
        factory: F,
    ) -> Result<Self>
    where
        F: SessionFactory + 'static,
    {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(HubError::InvalidArgument(
                "address must be a non-empty hub url".to_string(),
            ));
        }

        let inner = Arc::new(Inner {
            address,
            config: config.unwrap_or_default(),
            factory: Box::new(factory),
            session: Mutex::new(None),
            lifecycle: Mutex::new(Lifecycle::default()),
            close_handler: Mutex::new(None),
            stats: Mutex::new(ConnectionStats::default()),
            runtime: Mutex::new(None),
        });

        inner.create_session()?;

        Ok(Self { inner })
    }

    /// Start the connection.
    ///
    /// Concurrent callers share a single connect cycle. The returned future
    /// resolves once the session is connected, or fails with
    /// [`HubError::ConnectionAttemptsExhausted`] after
    /// `max_connection_attempts + 1` failed tries. The cycle runs on its own
    /// task, so dropping the future does not abort it.
    pub fn start(&self) -> StartFuture {
        self.inner.start(false)
    }

    /// Stop the connection without triggering a reconnect.
    ///
    /// Cancels a pending retry of an in-flight cycle, whose callers then
    /// see [`HubError::Stopped`]. A session start that completes after this
    /// call is stopped again instead of being reported as connected.
    pub async fn stop(&self) -> Result<()> {
        let Some(session) = self.inner.current_session() else {
            return Ok(());
        };

        let cycle = {
            let mut lifecycle = self.inner.lifecycle.lock().unwrap();
            lifecycle.closed_by_user = true;
            if let Some(cancel) = lifecycle.cancel.take() {
                cancel.cancel();
            }
            lifecycle.cycle
        };

        info!(address = %self.inner.address, "stopping hub connection");

        if session.state() != HubConnectionState::Disconnected {
            session.stop().await?;
        }

        let mut lifecycle = self.inner.lifecycle.lock().unwrap();
        if lifecycle.cycle == cycle {
            lifecycle.start_future = None;
        }
        Ok(())
    }

    /// Register the handler invoked on every close, replacing any previous one.
    pub fn on_close<F>(&self, handler: F)
    where
        F: Fn(Option<&HubError>) + Send + Sync + 'static,
    {
        *self.inner.close_handler.lock().unwrap() = Some(Arc::new(handler));
    }

    /// State reported by the session, or `Disconnected` when there is none.
    pub fn state(&self) -> HubConnectionState {
        self.inner
            .current_session()
            .map(|session| session.state())
            .unwrap_or_default()
    }

    /// Check if the session reports a live connection.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Get the hub address.
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    /// Get the effective configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Snapshot of the lifecycle statistics.
    pub fn stats(&self) -> ConnectionStats {
        self.inner.stats.lock().unwrap().clone()
    }

    /// Invoke a hub method and wait for its result.
    pub async fn invoke(&self, method: &str, args: Bytes) -> Result<Bytes> {
        self.session()?.invoke(method, args).await
    }

    /// Invoke a hub method without waiting for a response.
    pub async fn send(&self, method: &str, args: Bytes) -> Result<()> {
        self.session()?.send(method, args).await
    }

    /// Invoke a streaming hub method.
    pub fn stream(&self, method: &str, args: Bytes) -> Result<HubStream> {
        self.session()?.stream(method, args)
    }

    /// Register a handler for a client-side method.
    pub fn on(&self, method: &str, handler: MethodHandler) -> Result<()> {
        self.session()?.on(method, handler);
        Ok(())
    }

    /// Remove one handler for `method`, or all of them when `handler` is `None`.
    pub fn off(&self, method: &str, handler: Option<&MethodHandler>) -> Result<()> {
        self.session()?.off(method, handler);
        Ok(())
    }

    fn session(&self) -> Result<Arc<dyn Session>> {
        self.inner.current_session().ok_or(HubError::NotConnected)
    }
}

impl Inner {
    fn current_session(&self) -> Option<Arc<dyn Session>> {
        self.session.lock().unwrap().clone()
    }

    /// Build a session through the factory and hook its close notification.
    ///
    /// Must be called with no lock held: both the factory and the session's
    /// `on_close` may report a close synchronously.
    fn create_session(self: &Arc<Self>) -> Result<Arc<dyn Session>> {
        let session = self
            .factory
            .create_session(&self.address, self.config.log_level)?;

        let generation = {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            lifecycle.session_generation += 1;
            lifecycle.session_generation
        };
        *self.session.lock().unwrap() = Some(session.clone());
        debug!(address = %self.address, generation, "created hub session");

        let weak = Arc::downgrade(self);
        let on_close: CloseHandler = Arc::new(move |error: Option<&HubError>| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_close(generation, error);
            }
        });
        session.on_close(on_close);

        Ok(session)
    }

    fn pending_start(&self) -> Option<StartFuture> {
        self.lifecycle.lock().unwrap().start_future.clone()
    }

    /// Runtime for the next cycle: the current one, else the last one seen.
    fn runtime_handle(&self) -> Result<Handle> {
        let mut stored = self.runtime.lock().unwrap();
        match Handle::try_current() {
            Ok(current) => {
                *stored = Some(current.clone());
                Ok(current)
            }
            Err(_) => stored.clone().ok_or(HubError::NoRuntime),
        }
    }

    fn start(self: &Arc<Self>, reconnect: bool) -> StartFuture {
        if let Some(pending) = self.pending_start() {
            return pending;
        }

        let prepared = self.runtime_handle().and_then(|runtime| {
            if self.current_session().is_none() {
                self.create_session()?;
            }
            Ok(runtime)
        });

        let mut lifecycle = self.lifecycle.lock().unwrap();
        // A close reported while the session was rebuilt may have begun a cycle.
        if let Some(pending) = &lifecycle.start_future {
            return pending.clone();
        }

        match prepared.and_then(|runtime| self.begin_cycle(&mut lifecycle, runtime, reconnect)) {
            Ok(started) => started,
            Err(err) => {
                // Nothing was attempted; the next start() begins from scratch.
                lifecycle.session_generation += 1;
                lifecycle.cancel = None;
                lifecycle.start_future = None;
                *self.session.lock().unwrap() = None;
                warn!(address = %self.address, error = %err, "could not begin connect cycle");
                future::ready(Err(err)).boxed().shared()
            }
        }
    }

    fn begin_cycle(
        self: &Arc<Self>,
        lifecycle: &mut Lifecycle,
        runtime: Handle,
        reconnect: bool,
    ) -> Result<StartFuture> {
        let session = self.current_session().ok_or(HubError::NotConnected)?;

        lifecycle.closed_by_user = false;
        lifecycle.cycle += 1;
        let cycle = lifecycle.cycle;
        let cancel = CancellationToken::new();
        lifecycle.cancel = Some(cancel.clone());

        if reconnect {
            self.stats.lock().unwrap().record_reconnect();
        }

        let task = runtime.spawn(Arc::clone(self).run_cycle(session, cancel, cycle));
        let started = async move {
            match task.await {
                Ok(result) => result,
                Err(err) => Err(HubError::session(format!("connect task failed: {err}"))),
            }
        }
        .boxed()
        .shared();

        lifecycle.start_future = Some(started.clone());
        Ok(started)
    }

    /// Call `start` on the session until it succeeds or the budget runs out.
    async fn run_cycle(
        self: Arc<Self>,
        session: Arc<dyn Session>,
        cancel: CancellationToken,
        cycle: u64,
    ) -> Result<()> {
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(HubError::Stopped);
            }

            self.stats.lock().unwrap().record_attempt();

            let err = match session.start().await {
                Ok(()) if cancel.is_cancelled() => {
                    debug!(address = %self.address, attempt, "start finished after cancel");
                    if self.closed_by_user() {
                        if let Err(err) = session.stop().await {
                            warn!(address = %self.address, error = %err, "failed to stop session");
                        }
                    }
                    return Err(HubError::Stopped);
                }
                Ok(()) => {
                    self.stats.lock().unwrap().record_connect();
                    info!(address = %self.address, attempt, "hub connection established");
                    return Ok(());
                }
                Err(err) => err,
            };

            self.stats.lock().unwrap().record_failure();

            if !self.config.should_retry(attempt) {
                let attempts = self.config.total_attempts();
                warn!(
                    address = %self.address,
                    attempts,
                    error = %err,
                    "giving up on hub connection"
                );
                self.stats.lock().unwrap().record_exhausted();
                self.finish_cycle(cycle);
                return Err(HubError::ConnectionAttemptsExhausted { attempts });
            }

            debug!(
                address = %self.address,
                attempt,
                max_attempts = self.config.max_connection_attempts,
                retry_in = ?self.config.retry_interval,
                error = %err,
                "connection attempt failed"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(address = %self.address, attempt, "connect cycle cancelled");
                    return Err(HubError::Stopped);
                }
                _ = sleep(self.config.retry_interval) => {}
            }

            attempt += 1;
        }
    }

    /// A newer `start()` clears the flag, handing the session to its cycle.
    fn closed_by_user(&self) -> bool {
        self.lifecycle.lock().unwrap().closed_by_user
    }

    /// Release the start future of an exhausted cycle, unless a newer one
    /// has replaced it.
    fn finish_cycle(&self, cycle: u64) {
        let mut lifecycle = self.lifecycle.lock().unwrap();
        if lifecycle.cycle == cycle {
            lifecycle.start_future = None;
            lifecycle.cancel = None;
        }
    }

    fn handle_close(self: &Arc<Self>, generation: u64, error: Option<&HubError>) {
        let reconnect = {
            let mut lifecycle = self.lifecycle.lock().unwrap();
            if lifecycle.session_generation != generation {
                debug!(address = %self.address, generation, "ignoring close from stale session");
                return;
            }
            lifecycle.start_future = None;
            if let Some(cancel) = lifecycle.cancel.take() {
                cancel.cancel();
            }
            !lifecycle.closed_by_user
        };

        self.stats.lock().unwrap().record_close();
        match error {
            Some(err) => info!(address = %self.address, error = %err, "hub connection closed"),
            None => info!(address = %self.address, "hub connection closed"),
        }

        let handler = self.close_handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(error);
        }

        if reconnect {
            info!(address = %self.address, "reconnecting after unexpected close");
            // The cycle runs on its own task.
            drop(self.start(true));
        }
    }
}

impl fmt::Debug for AutoHubConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoHubConnection")
            .field("address", &self.inner.address)
            .field("state", &self.state())
            .field("config", &self.inner.config)
            .finish()
    }
}
