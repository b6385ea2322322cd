//! Event ingress: the validation boundary between the transport and the
//! pipeline.
//!
//! Raw transport objects are decoded here; malformed events are dropped and
//! counted, unknown event types are handed back untouched for the
//! transcript side, and valid events feed the turn accumulator.

use serde_json::Value;
use tracing::warn;

use crate::protocol::{self, AguiEvent, DecodeError, IncomingEvent};

use super::turn::{FinalizedTurn, TurnAccumulator};

/// What the ingress did with one raw transport object.
#[derive(Debug, Clone, PartialEq)]
pub enum IngressOutput {
    /// The event closed the in-progress turn.
    Turn(FinalizedTurn),
    /// The event was absorbed into the in-progress turn.
    Absorbed,
    /// Unknown event type, forwarded verbatim for the transcript view.
    Passthrough(Value),
    /// Malformed event, dropped. The stream continues.
    Dropped(DecodeError),
}

/// Decodes raw events and assembles turns.
#[derive(Default)]
pub struct EventIngress {
    accumulator: TurnAccumulator,
    dropped: u64,
}

impl EventIngress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one raw transport object.
    pub fn accept_raw(&mut self, raw: Value) -> IngressOutput {
        match protocol::decode_event(raw) {
            Ok(IncomingEvent::Known(event)) => self.accept(event),
            Ok(IncomingEvent::Passthrough(raw)) => IngressOutput::Passthrough(raw),
            Err(err) => {
                self.dropped += 1;
                warn!(error = %err, dropped = self.dropped, "dropping malformed event");
                IngressOutput::Dropped(err)
            }
        }
    }

    /// Accept one already-validated event.
    pub fn accept(&mut self, event: AguiEvent) -> IngressOutput {
        match self.accumulator.accept(event) {
            Some(turn) => IngressOutput::Turn(turn),
            None => IngressOutput::Absorbed,
        }
    }

    /// Whether the idle window applies (a turn is in progress).
    #[must_use]
    pub fn turn_open(&self) -> bool {
        self.accumulator.turn_open()
    }

    /// Close the in-progress turn after an idle window.
    pub fn idle_expired(&mut self) -> Option<FinalizedTurn> {
        self.accumulator.finalize_idle()
    }

    /// Close the in-progress turn because the stream ended.
    pub fn flush(&mut self) -> Option<FinalizedTurn> {
        self.accumulator.flush()
    }

    /// Count of malformed events dropped since startup.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

// === Unit Tests ===
