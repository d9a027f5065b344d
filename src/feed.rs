// Live metrics feed: connection manager -> reconciler -> published view

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::time::Duration;

use crate::models::MetricSnapshot;
use crate::presentation::{self, DashboardModel};
use crate::reconciler::MetricReconciler;
use crate::stream::{ConnectionState, StreamConnectionManager};
use crate::transport::StreamTransport;

/// What consumers render from: the connection state and the ordered reconciled view.
/// Both fields are published under the manager lock, so a snapshot never pairs a state
/// with batches delivered under a different one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub state: ConnectionState,
    pub metrics: Vec<MetricSnapshot>,
}

pub struct MetricsFeed<T: StreamTransport> {
    manager: StreamConnectionManager<T>,
    reconciler: Arc<Mutex<MetricReconciler>>,
    view_tx: Arc<watch::Sender<FeedSnapshot>>,
}

impl<T: StreamTransport> MetricsFeed<T> {
    pub fn new(transport: T) -> Self {
        let (view_tx, _) = watch::channel(FeedSnapshot::default());
        let view_tx = Arc::new(view_tx);

        let state_view = view_tx.clone();
        let manager = StreamConnectionManager::with_state_observer(transport, move |state| {
            state_view.send_modify(|view| view.state = state);
        });

        Self {
            manager,
            reconciler: Arc::new(Mutex::new(MetricReconciler::new())),
            view_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.view_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.manager.subscribe_state()
    }

    /// Ordered view as of the last merged batch.
    pub fn metrics(&self) -> Vec<MetricSnapshot> {
        self.view_tx.borrow().metrics.clone()
    }

    pub fn connect(&self) -> bool {
        let reconciler = self.reconciler.clone();
        let view_tx = self.view_tx.clone();
        self.manager.connect(move |batch| {
            let ordered = {
                let mut r = reconciler
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                r.merge(batch)
            };
            tracing::trace!(servers = ordered.len(), "metrics view updated");
            view_tx.send_modify(|view| view.metrics = ordered);
        })
    }

    /// Requests the close and clears the view right away, so no stale data sits next to a
    /// disconnected indicator. Also clears data kept from an unexpected close. A stream that
    /// is still connecting keeps its view, since its batches would refill it.
    pub fn disconnect(&self) -> bool {
        let requested = self.manager.disconnect();
        if requested || self.manager.state() == ConnectionState::Disconnected {
            self.reconciler
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .reset();
            self.view_tx.send_modify(|view| view.metrics.clear());
        }
        requested
    }

    pub async fn shutdown(&self, wait: Duration) {
        self.manager.shutdown(wait).await;
    }

    pub fn dashboard(&self) -> DashboardModel {
        let view = self.view_tx.borrow();
        presentation::render_dashboard(view.state, &view.metrics)
    }
}
