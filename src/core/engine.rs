//! Core engine for the adaptive panel.
//!
//! The engine consumes the agent event stream in a background task,
//! communicating with renderers via channels. This enables:
//! - Non-blocking ingestion while classification is in flight
//! - Strict in-arrival-order event processing per conversation
//! - Last-turn-wins discarding of stale classification results
//! - Serialized panel transitions, observed atomically by subscribers
//!
//! All mutable state (the accumulating turn, the current component) is
//! owned by this single loop; the plugin registry is immutable after
//! startup and shared freely.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classifier::IntentClassifier;
use crate::intent::ComponentIntent;
use crate::panel::{ApplyOutcome, PanelController, PanelError, PanelPhase, UiComponent};
use crate::registry::PluginRegistry;

use super::events::PanelEvent;
use super::ingress::{EventIngress, IngressOutput};
use super::turn::FinalizedTurn;

// === Types ===

/// Configuration for the engine loop.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Idle window after which an open turn is finalized.
    pub idle_window: Duration,
    /// Upper bound on one classification round-trip.
    pub classify_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_window: Duration::from_millis(1500),
            classify_timeout: Duration::from_millis(3000),
        }
    }
}

/// Operations submitted to the engine.
#[derive(Debug)]
pub enum PanelOp {
    /// One raw transport object.
    Event(Value),
    /// Explicit reset: the only way to blank the panel.
    Clear,
    /// The transport stream ended; settle pending work and stop.
    EndOfStream,
    /// Stop immediately.
    Shutdown,
}

/// Point-in-time view of the panel, published on every transition.
#[derive(Debug, Clone, Default)]
pub struct PanelSnapshot {
    pub phase: PanelPhase,
    pub current: Option<UiComponent>,
    pub last_error: Option<PanelError>,
    pub dropped_events: u64,
}

/// Handle to communicate with the engine.
#[derive(Clone)]
pub struct PanelHandle {
    tx_op: mpsc::Sender<PanelOp>,
    rx_snapshot: watch::Receiver<PanelSnapshot>,
}

impl PanelHandle {
    /// Submit one raw transport object.
    pub async fn send_event(&self, raw: Value) -> Result<()> {
        self.tx_op.send(PanelOp::Event(raw)).await?;
        Ok(())
    }

    /// Request an explicit panel reset.
    pub async fn clear(&self) -> Result<()> {
        self.tx_op.send(PanelOp::Clear).await?;
        Ok(())
    }

    /// Signal the end of the transport stream.
    pub async fn end_of_stream(&self) -> Result<()> {
        self.tx_op.send(PanelOp::EndOfStream).await?;
        Ok(())
    }

    /// Stop the engine without settling pending work.
    pub async fn shutdown(&self) -> Result<()> {
        self.tx_op.send(PanelOp::Shutdown).await?;
        Ok(())
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PanelSnapshot {
        self.rx_snapshot.borrow().clone()
    }

    /// The component occupying the slot, if any.
    #[must_use]
    pub fn current(&self) -> Option<UiComponent> {
        self.rx_snapshot.borrow().current.clone()
    }

    /// The most recent resolution failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<PanelError> {
        self.rx_snapshot.borrow().last_error.clone()
    }

    /// Subscribe to snapshot updates.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<PanelSnapshot> {
        self.rx_snapshot.clone()
    }
}

/// Result of one classification task, tagged with its turn sequence.
#[derive(Debug)]
struct ClassifyDone {
    seq: u64,
    result: Result<ComponentIntent, String>,
}

/// What woke the engine loop.
enum Wake {
    Op(Option<PanelOp>),
    Classified(ClassifyDone),
    IdleExpired,
}

// === Engine ===

/// The engine that consumes agent events and drives the panel.
pub struct Engine {
    config: EngineConfig,
    classifier: Arc<dyn IntentClassifier>,
    ingress: EventIngress,
    panel: PanelController,
    rx_op: mpsc::Receiver<PanelOp>,
    tx_event: mpsc::Sender<PanelEvent>,
    tx_snapshot: watch::Sender<PanelSnapshot>,
    tx_classify: mpsc::Sender<ClassifyDone>,
    rx_classify: mpsc::Receiver<ClassifyDone>,
    /// Sequence number of the most recent finalized turn.
    seq: u64,
    /// Whether the most recent turn's classification is unresolved.
    pending: bool,
    /// Cancels the in-flight classification when its turn is superseded.
    inflight: CancellationToken,
    /// Set once the stream ended; the loop stops after settling.
    draining: bool,
}

impl Engine {
    /// Create a new engine with the given configuration.
    pub fn new(
        config: EngineConfig,
        registry: Arc<PluginRegistry>,
        classifier: Arc<dyn IntentClassifier>,
    ) -> (Self, PanelHandle, mpsc::Receiver<PanelEvent>) {
        let (tx_op, rx_op) = mpsc::channel(64);
        let (tx_event, rx_event) = mpsc::channel(256);
        let (tx_classify, rx_classify) = mpsc::channel(16);
        let (tx_snapshot, rx_snapshot) = watch::channel(PanelSnapshot::default());

        let engine = Engine {
            config,
            classifier,
            ingress: EventIngress::new(),
            panel: PanelController::new(registry),
            rx_op,
            tx_event,
            tx_snapshot,
            tx_classify,
            rx_classify,
            seq: 0,
            pending: false,
            inflight: CancellationToken::new(),
            draining: false,
        };
        let handle = PanelHandle { tx_op, rx_snapshot };

        (engine, handle, rx_event)
    }

    /// Run the engine loop until shutdown or stream end.
    pub async fn run(mut self) {
        loop {
            let wake = tokio::select! {
                op = self.rx_op.recv(), if !self.draining => Wake::Op(op),
                Some(done) = self.rx_classify.recv() => Wake::Classified(done),
                () = tokio::time::sleep(self.config.idle_window),
                    if self.ingress.turn_open() => Wake::IdleExpired,
            };

            match wake {
                Wake::Op(Some(PanelOp::Event(raw))) => self.on_raw_event(raw).await,
                Wake::Op(Some(PanelOp::Clear)) => self.on_clear().await,
                Wake::Op(Some(PanelOp::Shutdown)) => break,
                Wake::Op(Some(PanelOp::EndOfStream)) | Wake::Op(None) => {
                    if self.on_end_of_stream().await {
                        break;
                    }
                }
                Wake::Classified(done) => {
                    self.on_classified(done).await;
                    if self.draining && !self.pending {
                        let _ = self.tx_event.send(PanelEvent::StreamEnded).await;
                        break;
                    }
                }
                Wake::IdleExpired => {
                    if let Some(turn) = self.ingress.idle_expired() {
                        self.start_classification(turn).await;
                    }
                }
            }
        }
    }

    async fn on_raw_event(&mut self, raw: Value) {
        match self.ingress.accept_raw(raw) {
            IngressOutput::Turn(turn) => self.start_classification(turn).await,
            IngressOutput::Absorbed => {}
            IngressOutput::Passthrough(event) => {
                let _ = self.tx_event.send(PanelEvent::Passthrough { event }).await;
            }
            IngressOutput::Dropped(err) => {
                let _ = self
                    .tx_event
                    .send(PanelEvent::dropped(err.to_string()))
                    .await;
                self.publish_snapshot();
            }
        }
    }

    async fn on_clear(&mut self) {
        self.inflight.cancel();
        self.pending = false;
        self.panel.clear();
        let _ = self.tx_event.send(PanelEvent::PanelCleared).await;
        self.publish_snapshot();
    }

    /// Returns true once the loop may stop.
    async fn on_end_of_stream(&mut self) -> bool {
        self.draining = true;
        if let Some(turn) = self.ingress.flush() {
            self.start_classification(turn).await;
        }
        if self.pending {
            return false;
        }
        let _ = self.tx_event.send(PanelEvent::StreamEnded).await;
        true
    }

    async fn start_classification(&mut self, turn: FinalizedTurn) {
        if turn.is_empty() {
            debug!("empty turn; nothing to classify");
            return;
        }

        // Supersede any in-flight classification: last turn wins.
        self.inflight.cancel();
        self.inflight = CancellationToken::new();
        self.seq += 1;
        self.pending = true;

        let _ = self
            .tx_event
            .send(PanelEvent::TurnFinalized {
                seq: self.seq,
                utterance: turn.utterance.clone(),
            })
            .await;

        let seq = self.seq;
        let token = self.inflight.clone();
        let classifier = Arc::clone(&self.classifier);
        let timeout = self.config.classify_timeout;
        let tx = self.tx_classify.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(seq, "classification superseded before resolving");
                }
                outcome = tokio::time::timeout(timeout, classifier.classify(turn)) => {
                    let result = match outcome {
                        Ok(Ok(intent)) => Ok(intent),
                        Ok(Err(err)) => Err(err.to_string()),
                        Err(_) => Err(format!(
                            "classification timed out after {}ms",
                            timeout.as_millis()
                        )),
                    };
                    let _ = tx.send(ClassifyDone { seq, result }).await;
                }
            }
        });
    }

    async fn on_classified(&mut self, done: ClassifyDone) {
        if done.seq != self.seq {
            debug!(seq = done.seq, current = self.seq, "discarding stale classification");
            let _ = self
                .tx_event
                .send(PanelEvent::ClassificationDiscarded { seq: done.seq })
                .await;
            return;
        }
        self.pending = false;

        match done.result {
            Err(reason) => {
                // Treated as `none` for the turn; the panel is untouched.
                warn!(seq = done.seq, %reason, "classification failed");
                let _ = self
                    .tx_event
                    .send(PanelEvent::classification_failed(done.seq, reason))
                    .await;
            }
            Ok(intent) => match self.panel.apply(intent) {
                ApplyOutcome::Unchanged => {
                    debug!(seq = done.seq, "no new instruction");
                }
                ApplyOutcome::Shown(component) => {
                    let _ = self
                        .tx_event
                        .send(PanelEvent::ComponentShown {
                            seq: done.seq,
                            component,
                        })
                        .await;
                    self.publish_snapshot();
                }
                ApplyOutcome::Rejected(error) => {
                    let _ = self
                        .tx_event
                        .send(PanelEvent::IntentRejected {
                            seq: done.seq,
                            error,
                        })
                        .await;
                    self.publish_snapshot();
                }
            },
        }
    }

    fn publish_snapshot(&self) {
        self.tx_snapshot.send_replace(PanelSnapshot {
            phase: self.panel.phase(),
            current: self.panel.current().cloned(),
            last_error: self.panel.last_error().cloned(),
            dropped_events: self.ingress.dropped(),
        });
    }
}

/// Spawn the engine in a background task.
pub fn spawn_engine(
    config: EngineConfig,
    registry: Arc<PluginRegistry>,
    classifier: Arc<dyn IntentClassifier>,
) -> (PanelHandle, mpsc::Receiver<PanelEvent>) {
    let (engine, handle, rx_event) = Engine::new(config, registry, classifier);
    tokio::spawn(engine.run());
    (handle, rx_event)
}

// === Unit Tests ===
