// Interval-driven transport that fabricates batches locally

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::{Duration, interval};

use super::{CLOSE_NORMAL, CloseReason, EventSink, StreamTransport, TransportEvent, TransportHandle, emit};
use crate::mock::MetricGenerator;
use crate::models::ResourceDescriptor;

/// Pushes one batch for the whole fleet on open, then one per interval.
/// Batches go out JSON-encoded so they take the same decode path as socket messages.
pub struct SimulatedTransport {
    fleet: Arc<Vec<ResourceDescriptor>>,
    interval: Duration,
    seed: Option<u64>,
}

impl SimulatedTransport {
    pub fn new(fleet: Vec<ResourceDescriptor>, interval_ms: u64) -> Self {
        Self {
            fleet: Arc::new(fleet),
            interval: Duration::from_millis(interval_ms),
            seed: None,
        }
    }

    /// Every open() replays the same metric sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl StreamTransport for SimulatedTransport {
    fn open(&self, events: EventSink) -> Box<dyn TransportHandle> {
        let (close_tx, close_rx) = oneshot::channel();
        let generator = match self.seed {
            Some(seed) => MetricGenerator::seeded(seed),
            None => MetricGenerator::new(),
        };
        tokio::spawn(run(
            self.fleet.clone(),
            self.interval,
            generator,
            events,
            close_rx,
        ));
        Box::new(SimulatedHandle {
            close_tx: Some(close_tx),
        })
    }

    fn describe(&self) -> String {
        format!("simulated ({} servers every {:?})", self.fleet.len(), self.interval)
    }
}

struct SimulatedHandle {
    close_tx: Option<oneshot::Sender<()>>,
}

impl TransportHandle for SimulatedHandle {
    fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn run(
    fleet: Arc<Vec<ResourceDescriptor>>,
    period: Duration,
    mut generator: MetricGenerator,
    events: EventSink,
    mut close_rx: oneshot::Receiver<()>,
) {
    emit(&events, TransportEvent::Opened);
    tracing::debug!("Mock stream connected");

    // First tick fires immediately: the initial batch
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let batch = generator.batch(&fleet);
                match serde_json::to_string(&batch) {
                    Ok(json) => emit(&events, TransportEvent::Message(json)),
                    Err(e) => tracing::warn!(error = %e, "failed to encode simulated batch"),
                }
            }
            _ = &mut close_rx => break,
        }
    }

    tracing::debug!("Mock stream disconnected");
    emit(
        &events,
        TransportEvent::Closed(CloseReason::Clean {
            code: CLOSE_NORMAL,
            reason: "client closed".into(),
        }),
    );
}
