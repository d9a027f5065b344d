// Mock backend routes: GET /api/servers and WS /ws/metrics

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use bytes::Bytes;
use futures_util::SinkExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{Duration, timeout};
use tower_http::cors::{Any, CorsLayer};

use super::MetricGenerator;
use crate::endpoints::{DIRECTORY_PATH, METRICS_STREAM_PATH};
use crate::models::ResourceDescriptor;
use crate::version::{NAME, VERSION};

const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
/// Max time to wait for a send before treating the client as dead.
const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct MockState {
    pub fleet: Arc<Vec<ResourceDescriptor>>,
    pub push_interval_ms: u64,
    pub ws_connections: Arc<AtomicUsize>,
}

impl MockState {
    pub fn new(fleet: Vec<ResourceDescriptor>, push_interval_ms: u64) -> Self {
        Self {
            fleet: Arc::new(fleet),
            push_interval_ms,
            ws_connections: Arc::new(AtomicUsize::new(0)),
        }
    }
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/version", get(version_handler)) // GET /version
        .route(DIRECTORY_PATH, get(servers_handler)) // GET /api/servers
        .route(METRICS_STREAM_PATH, get(ws_metrics)) // WS /ws/metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

async fn servers_handler(State(state): State<MockState>) -> impl IntoResponse {
    Json(state.fleet.as_ref().clone())
}

/// Decrements the connection count on drop (connect = +1, drop = -1).
struct WsConnectionGuard(Arc<AtomicUsize>);

impl Drop for WsConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

async fn ws_metrics(ws: WebSocketUpgrade, State(state): State<MockState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = stream_metrics(socket, state).await {
            tracing::info!("Metrics stream error: {}", e);
        }
    })
}

async fn stream_metrics(mut socket: WebSocket, state: MockState) -> anyhow::Result<()> {
    state.ws_connections.fetch_add(1, Ordering::Relaxed);
    let _guard = WsConnectionGuard(state.ws_connections.clone());
    tracing::info!("Client connected to metrics stream");

    let mut generator = MetricGenerator::new();
    let mut tick = tokio::time::interval(Duration::from_millis(state.push_interval_ms));
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let batch = generator.batch(&state.fleet);
                let json = serde_json::to_string(&batch)?;
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    return Ok(());
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    return Ok(());
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "metrics stream read failed");
                    return Ok(());
                }
            }
        }
    }

    // Flushes tungstenite's queued reply to the client's close frame
    let _ = timeout(WS_SEND_TIMEOUT, SinkExt::close(&mut socket)).await;
    tracing::info!("Client disconnected from metrics stream");
    Ok(())
}
