// WebSocket transport over tokio-tungstenite

use futures_util::StreamExt;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use super::{CloseReason, EventSink, StreamTransport, TransportEvent, TransportHandle, emit};
use crate::error::ConnectionError;

/// No status code present in the peer's close frame.
const CLOSE_NO_STATUS: u16 = 1005;

pub struct WebSocketTransport {
    url: Url,
    close_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(url: Url, close_timeout_ms: u64) -> Self {
        Self {
            url,
            close_timeout: Duration::from_millis(close_timeout_ms),
        }
    }
}

impl StreamTransport for WebSocketTransport {
    fn open(&self, events: EventSink) -> Box<dyn TransportHandle> {
        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(run(self.url.clone(), self.close_timeout, events, close_rx));
        Box::new(WebSocketHandle {
            close_tx: Some(close_tx),
        })
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Dropping the sender also resolves `close_rx`, so a dropped handle closes the socket.
struct WebSocketHandle {
    close_tx: Option<oneshot::Sender<()>>,
}

impl TransportHandle for WebSocketHandle {
    fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn run(
    url: Url,
    close_timeout: Duration,
    events: EventSink,
    mut close_rx: oneshot::Receiver<()>,
) {
    let mut ws = tokio::select! {
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((ws, _response)) => ws,
            Err(e) => {
                emit(
                    &events,
                    TransportEvent::Closed(CloseReason::Failed(ConnectionError::Connect(e.to_string()))),
                );
                return;
            }
        },
        _ = &mut close_rx => {
            tracing::debug!(url = %url, "close requested before the socket opened");
            emit(
                &events,
                TransportEvent::Closed(CloseReason::Clean {
                    code: super::CLOSE_NORMAL,
                    reason: String::new(),
                }),
            );
            return;
        }
    };
    emit(&events, TransportEvent::Opened);

    let mut close_deadline: Option<Instant> = None;
    let mut peer_close: Option<(u16, String)> = None;

    let reason = loop {
        tokio::select! {
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    emit(&events, TransportEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => emit(&events, TransportEvent::Message(text)),
                    Err(e) => tracing::warn!(error = %e, "dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    peer_close = Some(
                        frame
                            .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                            .unwrap_or((CLOSE_NO_STATUS, String::new())),
                    );
                }
                // Ping/pong replies are queued by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => break CloseReason::Failed(ConnectionError::Protocol(e.to_string())),
                None => {
                    break match peer_close.take() {
                        Some((code, reason)) => CloseReason::Clean { code, reason },
                        None => CloseReason::Failed(ConnectionError::ConnectionDied),
                    };
                }
            },
            // Once the peer has sent its close frame tungstenite finishes the handshake itself
            _ = &mut close_rx, if close_deadline.is_none() && peer_close.is_none() => {
                close_deadline = Some(Instant::now() + close_timeout);
                if let Err(e) = ws.close(None).await {
                    break CloseReason::Failed(ConnectionError::Protocol(e.to_string()));
                }
            }
            _ = sleep_until(close_deadline.unwrap_or_else(Instant::now)), if close_deadline.is_some() => {
                break CloseReason::Failed(ConnectionError::CloseTimeout(
                    close_timeout.as_millis() as u64,
                ));
            }
        }
    };

    drop(ws);
    emit(&events, TransportEvent::Closed(reason));
}
