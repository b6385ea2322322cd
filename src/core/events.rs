//! Events emitted by the pipeline to its subscribers.
//!
//! These events flow from the engine to renderers and transcript consumers
//! via a channel, enabling non-blocking, real-time updates. They are
//! notifications, not state: the authoritative panel state lives in the
//! watch snapshot exposed by the engine handle.

use serde_json::Value;

use crate::panel::{PanelError, UiComponent};

/// Events emitted by the engine while consuming the agent stream.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    // === Turn Lifecycle ===
    /// A turn was finalized and handed to the classifier.
    TurnFinalized { seq: u64, utterance: String },

    // === Panel Transitions ===
    /// A resolved intent replaced the slot with a fresh component.
    ComponentShown { seq: u64, component: UiComponent },

    /// The intent's kind has no registered plugin; the panel keeps its
    /// prior component and records the failure.
    IntentRejected { seq: u64, error: PanelError },

    /// The panel was explicitly reset.
    PanelCleared,

    // === Stream Hygiene ===
    /// A malformed event was dropped; the stream continues.
    EventDropped { reason: String },

    /// An event type outside the pipeline contract, forwarded verbatim
    /// for the transcript view.
    Passthrough { event: Value },

    /// A classification result arrived after its turn was superseded and
    /// was discarded unapplied.
    ClassificationDiscarded { seq: u64 },

    /// Classification failed or timed out; treated as `none` for the turn.
    ClassificationFailed { seq: u64, reason: String },

    /// The event stream ended and all pending work settled.
    StreamEnded,
}

impl PanelEvent {
    /// Create an event-dropped notification.
    pub fn dropped(reason: impl Into<String>) -> Self {
        PanelEvent::EventDropped {
            reason: reason.into(),
        }
    }

    /// Create a classification-failed notification.
    pub fn classification_failed(seq: u64, reason: impl Into<String>) -> Self {
        PanelEvent::ClassificationFailed {
            seq,
            reason: reason.into(),
        }
    }
}
