//! Turn accumulation.
//!
//! A "turn" is one complete operator/customer utterance: the ordered
//! concatenation of text deltas plus any state deltas and at most one
//! captured tool call, delimited by a terminal marker or an idle window.

use serde_json::Value;
use tracing::warn;

use crate::protocol::AguiEvent;

/// Why a turn was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnBoundary {
    /// A `TOOL_CALL_END` terminal marker was observed.
    ToolCallEnd,
    /// No delta arrived within the bounded idle window.
    Idle,
    /// The event stream ended with a turn still open.
    StreamEnd,
}

/// A tool call captured from a `TOOL_CALL_START`/`TOOL_CALL_END` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
    /// False when the turn closed before the matching `TOOL_CALL_END`.
    pub complete: bool,
}

/// One finalized turn, handed to the intent classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedTurn {
    /// Ordered concatenation of `TEXT_MESSAGE_CONTENT` deltas.
    pub utterance: String,
    /// JSON Patch operations from the turn's `STATE_DELTA` events, in order.
    pub state_deltas: Vec<Value>,
    /// The turn's tool call, if one was observed.
    pub tool_call: Option<CapturedToolCall>,
    pub boundary: TurnBoundary,
}

impl FinalizedTurn {
    /// Whether the turn carries nothing classifiable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.utterance.is_empty() && self.state_deltas.is_empty() && self.tool_call.is_none()
    }
}

/// Accumulates the single in-progress turn.
///
/// The accumulator buffers at most the current message: finalizing drains
/// it and leaves it ready for the next turn.
#[derive(Default)]
pub struct TurnAccumulator {
    utterance: String,
    state_deltas: Vec<Value>,
    tool_call: Option<CapturedToolCall>,
    open: bool,
}

impl TurnAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a turn is currently in progress (idle window applies).
    #[must_use]
    pub fn turn_open(&self) -> bool {
        self.open
    }

    /// Absorb one event. Returns the finalized turn when the event is a
    /// terminal marker.
    pub fn accept(&mut self, event: AguiEvent) -> Option<FinalizedTurn> {
        match event {
            AguiEvent::TextMessageContent { delta, .. } => {
                self.utterance.push_str(&delta);
                self.open = true;
                None
            }
            AguiEvent::StateDelta { delta, .. } => {
                self.state_deltas.extend(delta);
                self.open = true;
                None
            }
            AguiEvent::ToolCallStart {
                tool_call_id,
                tool_call_name,
                args,
                ..
            } => {
                if let Some(previous) = &self.tool_call {
                    warn!(
                        replaced = %previous.id,
                        by = %tool_call_id,
                        "second tool call started within one turn; keeping the newer one"
                    );
                }
                self.tool_call = Some(CapturedToolCall {
                    id: tool_call_id,
                    name: tool_call_name,
                    args,
                    complete: false,
                });
                self.open = true;
                None
            }
            AguiEvent::ToolCallEnd { tool_call_id, .. } => {
                match &mut self.tool_call {
                    Some(call) if call.id == tool_call_id => call.complete = true,
                    Some(call) => {
                        warn!(
                            expected = %call.id,
                            got = %tool_call_id,
                            "tool call end did not match the captured start; dropping the call"
                        );
                        self.tool_call = None;
                    }
                    None => {
                        warn!(id = %tool_call_id, "tool call end without a start");
                    }
                }
                Some(self.finalize(TurnBoundary::ToolCallEnd))
            }
        }
    }

    /// Finalize on idle-window expiry. Returns nothing if no turn is open.
    pub fn finalize_idle(&mut self) -> Option<FinalizedTurn> {
        self.open.then(|| self.finalize(TurnBoundary::Idle))
    }

    /// Finalize on stream end. Returns nothing if no turn is open.
    pub fn flush(&mut self) -> Option<FinalizedTurn> {
        self.open.then(|| self.finalize(TurnBoundary::StreamEnd))
    }

    fn finalize(&mut self, boundary: TurnBoundary) -> FinalizedTurn {
        self.open = false;
        FinalizedTurn {
            utterance: std::mem::take(&mut self.utterance),
            state_deltas: std::mem::take(&mut self.state_deltas),
            tool_call: self.tool_call.take(),
            boundary,
        }
    }
}

// === Unit Tests ===

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::protocol::AguiEvent;

    use super::{TurnAccumulator, TurnBoundary};

    #[test]
    fn utterance_is_ordered_concatenation_of_deltas() {
        let mut acc = TurnAccumulator::new();
        for delta in ["У клиента ", "пропал ", "интернет"] {
            assert!(
                acc.accept(AguiEvent::text_message_content("m1", delta))
                    .is_none()
            );
        }

        let turn = acc
            .accept(AguiEvent::tool_call_end("t1"))
            .expect("terminal marker finalizes");

        assert_eq!(turn.utterance, "У клиента пропал интернет");
        assert_eq!(turn.boundary, TurnBoundary::ToolCallEnd);
    }

    #[test]
    fn tool_call_pair_is_captured_complete() {
        let mut acc = TurnAccumulator::new();
        acc.accept(AguiEvent::tool_call_start(
            "t1",
            "show_component",
            json!({"type": "date-picker"}),
        ));
        let turn = acc
            .accept(AguiEvent::tool_call_end("t1"))
            .expect("finalized");

        let call = turn.tool_call.expect("captured");
        assert!(call.complete);
        assert_eq!(call.name, "show_component");
        assert_eq!(call.args, json!({"type": "date-picker"}));
    }

    #[test]
    fn mismatched_end_drops_the_call_but_still_finalizes() {
        let mut acc = TurnAccumulator::new();
        acc.accept(AguiEvent::tool_call_start("t1", "show_component", json!({})));
        let turn = acc
            .accept(AguiEvent::tool_call_end("t2"))
            .expect("finalized");

        assert!(turn.tool_call.is_none());
    }

    #[test]
    fn idle_finalizes_only_an_open_turn() {
        let mut acc = TurnAccumulator::new();
        assert!(acc.finalize_idle().is_none());

        acc.accept(AguiEvent::text_message_content(
            "m1",
            "когда приедет мастер",
        ));
        let turn = acc.finalize_idle().expect("open turn");

        assert_eq!(turn.boundary, TurnBoundary::Idle);
        assert_eq!(turn.utterance, "когда приедет мастер");
        assert!(acc.finalize_idle().is_none(), "accumulator drained");
    }

    #[test]
    fn state_deltas_accumulate_in_order() {
        let mut acc = TurnAccumulator::new();
        acc.accept(AguiEvent::state_delta(vec![json!({
            "op": "replace", "path": "/step", "value": 1
        })]));
        acc.accept(AguiEvent::state_delta(vec![json!({
            "op": "replace", "path": "/step", "value": 2
        })]));

        let turn = acc.finalize_idle().expect("open turn");
        assert_eq!(turn.state_deltas.len(), 2);
        assert_eq!(turn.state_deltas[1]["value"], json!(2));
    }

    #[test]
    fn next_turn_starts_clean_after_finalize() {
        let mut acc = TurnAccumulator::new();
        acc.accept(AguiEvent::text_message_content("m1", "первый"));
        acc.accept(AguiEvent::tool_call_end("t1"));

        acc.accept(AguiEvent::text_message_content("m2", "второй"));
        let turn = acc.finalize_idle().expect("second turn");

        assert_eq!(turn.utterance, "второй");
        assert!(turn.tool_call.is_none());
    }
}
