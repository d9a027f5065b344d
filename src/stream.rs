// Stream connection manager: owns the single live transport and the connection state.
//
// All state sits behind one mutex and every transport event is handled while holding it,
// so connect/disconnect never interleave with a batch being delivered and batches are
// delivered one at a time, in arrival order.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, timeout};

use crate::error::DecodeError;
use crate::models::MetricSnapshot;
use crate::transport::{CloseReason, StreamTransport, TransportEvent, TransportHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Receives each decoded batch. Runs under the manager lock: it must not call back into the
/// manager.
pub type BatchHandler = Box<dyn FnMut(Vec<MetricSnapshot>) + Send>;

struct Subscription {
    id: u64,
    handle: Box<dyn TransportHandle>,
    on_batch: BatchHandler,
    /// Close requested; later batches are dropped.
    closing: bool,
}

#[derive(Default)]
struct Inner {
    subscription: Option<Subscription>,
    next_id: u64,
}

/// Called with every state change, under the manager lock.
pub type StateObserver = Box<dyn Fn(ConnectionState) + Send + Sync>;

struct StateCell {
    tx: watch::Sender<ConnectionState>,
    observer: Option<StateObserver>,
}

impl StateCell {
    /// Observer first: a `state()` reader never sees a state the observer has not.
    fn set(&self, state: ConnectionState) {
        if let Some(observer) = &self.observer {
            observer(state);
        }
        self.tx.send_replace(state);
    }
}

pub struct StreamConnectionManager<T: StreamTransport> {
    transport: T,
    inner: Arc<Mutex<Inner>>,
    state: Arc<StateCell>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Decodes one stream message as a batch of snapshots.
pub fn decode_batch(text: &str) -> Result<Vec<MetricSnapshot>, DecodeError> {
    Ok(serde_json::from_str(text)?)
}

impl<T: StreamTransport> StreamConnectionManager<T> {
    pub fn new(transport: T) -> Self {
        Self::build(transport, None)
    }

    /// Like `new`, but `observer` sees each state change in the same critical section that
    /// delivers batches, so it never observes the two out of order.
    pub fn with_state_observer<F>(transport: T, observer: F) -> Self
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        Self::build(transport, Some(Box::new(observer)))
    }

    fn build(transport: T, observer: Option<StateObserver>) -> Self {
        let (tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            inner: Arc::new(Mutex::new(Inner::default())),
            state: Arc::new(StateCell { tx, observer }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.tx.subscribe()
    }

    /// True between a close request and the transport's close acknowledgment.
    pub fn is_closing(&self) -> bool {
        lock(&self.inner)
            .subscription
            .as_ref()
            .is_some_and(|s| s.closing)
    }

    /// Opens the transport unless a subscription is already live (then a logged no-op).
    /// Returns whether a transport was opened. Must be called inside a Tokio runtime.
    pub fn connect<F>(&self, on_batch: F) -> bool
    where
        F: FnMut(Vec<MetricSnapshot>) + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        if inner.subscription.is_some() || self.state() != ConnectionState::Disconnected {
            tracing::warn!(
                state = ?self.state(),
                "Metrics stream is already connected or connecting."
            );
            return false;
        }

        let id = inner.next_id;
        inner.next_id += 1;
        tracing::info!(
            subscription = id,
            endpoint = %self.transport.describe(),
            "Connecting to metrics stream..."
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        // A panic before the handle is stored drops it, which closes the transport
        let handle = self.transport.open(events_tx);
        tokio::spawn(dispatch(
            id,
            events_rx,
            self.inner.clone(),
            self.state.clone(),
        ));
        inner.subscription = Some(Subscription {
            id,
            handle,
            on_batch: Box::new(on_batch),
            closing: false,
        });
        self.state.set(ConnectionState::Connecting);
        true
    }

    /// Requests a close of a CONNECTED stream; otherwise a logged no-op. Returns whether a
    /// close was requested. The state stays CONNECTED until the transport confirms.
    pub fn disconnect(&self) -> bool {
        let mut inner = lock(&self.inner);
        let connected = self.state() == ConnectionState::Connected;
        match inner.subscription.as_mut() {
            Some(sub) if connected && !sub.closing => {
                tracing::info!(subscription = sub.id, "Disconnecting metrics stream.");
                sub.closing = true;
                sub.handle.close();
                true
            }
            _ => {
                tracing::warn!("No active metrics stream connection to disconnect.");
                false
            }
        }
    }

    /// Closes any live transport, connecting or connected, and waits up to `wait` for the
    /// close acknowledgment.
    pub async fn shutdown(&self, wait: Duration) {
        let mut state_rx = self.state.tx.subscribe();
        {
            let mut inner = lock(&self.inner);
            let Some(sub) = inner.subscription.as_mut() else {
                return;
            };
            if !sub.closing {
                sub.closing = true;
                sub.handle.close();
            }
        }
        let closed = timeout(
            wait,
            state_rx.wait_for(|s| *s == ConnectionState::Disconnected),
        )
        .await;
        if closed.is_err() {
            tracing::warn!(wait_ms = wait.as_millis() as u64, "metrics stream did not close in time");
        }
    }
}

impl<T: StreamTransport> Drop for StreamConnectionManager<T> {
    fn drop(&mut self) {
        let mut inner = lock(&self.inner);
        if let Some(sub) = inner.subscription.as_mut()
            && !sub.closing
        {
            sub.closing = true;
            sub.handle.close();
        }
    }
}

async fn dispatch(
    id: u64,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    inner: Arc<Mutex<Inner>>,
    state: Arc<StateCell>,
) {
    while let Some(event) = events.recv().await {
        let mut guard = lock(&inner);
        let Some(sub) = guard.subscription.as_mut().filter(|s| s.id == id) else {
            tracing::debug!(subscription = id, "event for a stale subscription ignored");
            return;
        };
        match event {
            TransportEvent::Opened => {
                tracing::info!(subscription = id, "Metrics stream connection established.");
                state.set(ConnectionState::Connected);
            }
            TransportEvent::Message(text) => {
                if sub.closing {
                    tracing::debug!(subscription = id, "batch received while closing dropped");
                    continue;
                }
                match decode_batch(&text) {
                    Ok(batch) => (sub.on_batch)(batch),
                    Err(e) => tracing::warn!(subscription = id, error = %e, "malformed metrics message dropped"),
                }
            }
            TransportEvent::Closed(close) => {
                match &close {
                    CloseReason::Clean { code, reason } => tracing::info!(
                        subscription = id,
                        code,
                        reason = %reason,
                        "Metrics stream closed cleanly"
                    ),
                    CloseReason::Failed(e) => tracing::error!(
                        subscription = id,
                        error = %e,
                        "Metrics stream connection died"
                    ),
                }
                guard.subscription = None;
                state.set(ConnectionState::Disconnected);
                return;
            }
        }
    }

    // Transport task ended without a Closed event
    let mut guard = lock(&inner);
    if guard.subscription.as_ref().is_some_and(|s| s.id == id) {
        tracing::error!(subscription = id, "Metrics stream transport vanished");
        guard.subscription = None;
        state.set(ConnectionState::Disconnected);
    }
}
