// Stream transport capability: one lifecycle for a real socket or a simulated push

mod simulated;
mod websocket;

pub use simulated::SimulatedTransport;
pub use websocket::WebSocketTransport;

use tokio::sync::mpsc;

use crate::error::ConnectionError;

/// Events a transport delivers, in arrival order. `Closed` is always the last one.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CloseReason {
    /// Close handshake completed (either side initiated it).
    Clean { code: u16, reason: String },
    /// Transport died or failed to establish.
    Failed(ConnectionError),
}

impl CloseReason {
    pub fn was_clean(&self) -> bool {
        matches!(self, CloseReason::Clean { .. })
    }
}

pub type EventSink = mpsc::UnboundedSender<TransportEvent>;

/// Normal closure code used when the client ends the stream.
pub const CLOSE_NORMAL: u16 = 1000;

pub trait StreamTransport: Send + Sync + 'static {
    /// Starts the transport without blocking; must be called inside a Tokio runtime.
    /// Exactly one `TransportEvent::Closed` is sent per call.
    fn open(&self, events: EventSink) -> Box<dyn TransportHandle>;

    /// Human-readable target for logs (URL or "simulated").
    fn describe(&self) -> String;
}

/// Live transport owned by the connection manager. Dropping it requests a close.
pub trait TransportHandle: Send {
    /// Requests a clean close and returns immediately; `Closed` follows asynchronously.
    fn close(&mut self);
}

fn emit(events: &EventSink, event: TransportEvent) {
    if events.send(event).is_err() {
        tracing::trace!("transport event dropped; receiver gone");
    }
}
