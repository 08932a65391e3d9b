//! Scripted session and counting factory shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use autohub_rs::{
    CloseHandler, HubConnectionState, HubError, HubStream, LogLevel, MethodHandler, Result,
    Session, SessionFactory,
};
use bytes::Bytes;
use futures::StreamExt;
use tokio::time::Instant;

/// A session whose `start` outcomes are scripted by the test.
#[derive(Default)]
pub struct MockSession {
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    fail_next_starts: AtomicUsize,
    always_fail: AtomicBool,
    close_on_register: AtomicBool,
    start_delay: Mutex<Option<Duration>>,
    state: Mutex<HubConnectionState>,
    close_handlers: Mutex<Vec<CloseHandler>>,
    method_handlers: Mutex<HashMap<String, Vec<MethodHandler>>>,
    start_times: Mutex<Vec<Instant>>,
}

impl MockSession {
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Make the next `count` start calls fail.
    pub fn fail_next_starts(&self, count: usize) {
        self.fail_next_starts.store(count, Ordering::SeqCst);
    }

    /// Make every start call fail until reset.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Make every start call take `delay` before it settles.
    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = Some(delay);
    }

    /// Report the connection as already closed when a close handler is registered.
    pub fn set_close_on_register(&self, close: bool) {
        self.close_on_register.store(close, Ordering::SeqCst);
    }

    pub fn close_handler_count(&self) -> usize {
        self.close_handlers.lock().unwrap().len()
    }

    pub fn handler_count(&self, method: &str) -> usize {
        self.method_handlers
            .lock()
            .unwrap()
            .get(method)
            .map_or(0, Vec::len)
    }

    /// Deliver `args` to every handler registered for `method`.
    pub fn dispatch(&self, method: &str, args: Bytes) {
        let handlers = self
            .method_handlers
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(args.clone());
        }
    }

    pub fn start_times(&self) -> Vec<Instant> {
        self.start_times.lock().unwrap().clone()
    }

    /// Simulate the connection dropping.
    pub fn drop_connection(&self, error: Option<HubError>) {
        *self.state.lock().unwrap() = HubConnectionState::Disconnected;
        self.fire_close(error.as_ref());
    }

    fn fire_close(&self, error: Option<&HubError>) {
        let handlers = self.close_handlers.lock().unwrap().clone();
        for handler in handlers {
            handler(error);
        }
    }
}

#[async_trait]
impl Session for MockSession {
    async fn start(&self) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start_times.lock().unwrap().push(Instant::now());

        let delay = *self.start_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted_failure = self
            .fail_next_starts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure || self.always_fail.load(Ordering::SeqCst) {
            return Err(HubError::session("negotiation failed"));
        }

        *self.state.lock().unwrap() = HubConnectionState::Connected;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = HubConnectionState::Disconnected;
        self.fire_close(None);
        Ok(())
    }

    fn state(&self) -> HubConnectionState {
        *self.state.lock().unwrap()
    }

    fn on_close(&self, handler: CloseHandler) {
        self.close_handlers.lock().unwrap().push(handler.clone());
        if self.close_on_register.load(Ordering::SeqCst) {
            handler(Some(&HubError::session("closed before registration")));
        }
    }

    async fn invoke(&self, method: &str, args: Bytes) -> Result<Bytes> {
        if !self.state().is_connected() {
            return Err(HubError::NotConnected);
        }
        let mut reply = Vec::from(method.as_bytes());
        reply.push(b':');
        reply.extend_from_slice(&args);
        Ok(Bytes::from(reply))
    }

    async fn send(&self, _method: &str, _args: Bytes) -> Result<()> {
        if !self.state().is_connected() {
            return Err(HubError::NotConnected);
        }
        Ok(())
    }

    fn stream(&self, _method: &str, args: Bytes) -> Result<HubStream> {
        if !self.state().is_connected() {
            return Err(HubError::NotConnected);
        }
        let items: Vec<Result<Bytes>> = args
            .split(|b| *b == b',')
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(futures::stream::iter(items).boxed())
    }

    fn on(&self, method: &str, handler: MethodHandler) {
        self.method_handlers
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push(handler);
    }

    fn off(&self, method: &str, handler: Option<&MethodHandler>) {
        let mut handlers = self.method_handlers.lock().unwrap();
        match handler {
            Some(target) => {
                if let Some(list) = handlers.get_mut(method) {
                    list.retain(|h| !Arc::ptr_eq(h, target));
                }
            }
            None => {
                handlers.remove(method);
            }
        }
    }
}

/// Hands out the same [`MockSession`] and counts how often it is asked to.
#[derive(Clone, Default)]
pub struct MockFactory {
    pub session: Arc<MockSession>,
    created: Arc<AtomicUsize>,
    last_level: Arc<Mutex<Option<LogLevel>>>,
}

impl MockFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn last_level(&self) -> Option<LogLevel> {
        *self.last_level.lock().unwrap()
    }
}

impl SessionFactory for MockFactory {
    fn create_session(&self, _address: &str, log_level: LogLevel) -> Result<Arc<dyn Session>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_level.lock().unwrap() = Some(log_level);
        Ok(self.session.clone() as Arc<dyn Session>)
    }
}
