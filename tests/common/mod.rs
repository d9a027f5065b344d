// Shared test helpers
#![allow(dead_code)]

use fleetwatch::error::ConnectionError;
use fleetwatch::models::*;
use fleetwatch::stream::ConnectionState;
use fleetwatch::transport::{
    CLOSE_NORMAL, CloseReason, EventSink, StreamTransport, TransportEvent, TransportHandle,
};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{Duration, timeout};

pub const WAIT: Duration = Duration::from_secs(2);

pub fn snapshot(id: &str, name: &str, cpu: f64) -> MetricSnapshot {
    MetricSnapshot::new(
        ResourceDescriptor::new(id, name, "10.0.0.1", "us-east-1"),
        ResourceStatus::Online,
        cpu,
        40.0,
    )
}

pub async fn wait_for_state(rx: &mut watch::Receiver<ConnectionState>, state: ConnectionState) {
    timeout(WAIT, rx.wait_for(|s| *s == state))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {:?}", state))
        .expect("state channel closed");
}

#[derive(Default)]
struct ScriptState {
    sinks: Vec<EventSink>,
    close_requests: usize,
}

/// Transport driven by the test: every event is pushed by hand.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the manager opened this transport.
    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().sinks.len()
    }

    pub fn close_requests(&self) -> usize {
        self.state.lock().unwrap().close_requests
    }

    /// Sends to the most recently opened stream.
    pub fn emit(&self, event: TransportEvent) {
        let state = self.state.lock().unwrap();
        let sink = state.sinks.last().expect("transport never opened");
        let _ = sink.send(event);
    }

    pub fn confirm_open(&self) {
        self.emit(TransportEvent::Opened);
    }

    pub fn push_batch(&self, batch: &[MetricSnapshot]) {
        self.emit(TransportEvent::Message(serde_json::to_string(batch).unwrap()));
    }

    pub fn push_raw(&self, text: &str) {
        self.emit(TransportEvent::Message(text.to_string()));
    }

    pub fn acknowledge_close(&self) {
        self.emit(TransportEvent::Closed(CloseReason::Clean {
            code: CLOSE_NORMAL,
            reason: String::new(),
        }));
    }

    pub fn die(&self) {
        self.emit(TransportEvent::Closed(CloseReason::Failed(
            ConnectionError::ConnectionDied,
        )));
    }
}

impl StreamTransport for ScriptedTransport {
    fn open(&self, events: EventSink) -> Box<dyn TransportHandle> {
        self.state.lock().unwrap().sinks.push(events);
        Box::new(ScriptedHandle {
            state: self.state.clone(),
        })
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

struct ScriptedHandle {
    state: Arc<Mutex<ScriptState>>,
}

impl TransportHandle for ScriptedHandle {
    fn close(&mut self) {
        self.state.lock().unwrap().close_requests += 1;
    }
}
