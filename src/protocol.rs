//! AG-UI wire events consumed from the agent transport.
//!
//! The transport delivers newline-delimited JSON objects tagged by a `type`
//! field. Four event types form the contract this pipeline relies on; any
//! other tag is passed through untouched for the transcript view. Payloads
//! are validated here, at the ingress boundary, so downstream code never
//! handles untyped data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Event tags this pipeline consumes. Extending the set is a protocol
/// version bump, not a runtime concern.
pub const KNOWN_EVENT_TYPES: [&str; 4] = [
    "TEXT_MESSAGE_CONTENT",
    "TOOL_CALL_START",
    "TOOL_CALL_END",
    "STATE_DELTA",
];

/// A validated AG-UI event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AguiEvent {
    /// Incremental text content for the in-progress message.
    #[serde(rename = "TEXT_MESSAGE_CONTENT")]
    TextMessageContent {
        #[serde(rename = "messageId")]
        message_id: String,
        delta: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },

    /// A tool call has started; `args` carries its full argument payload.
    #[serde(rename = "TOOL_CALL_START")]
    ToolCallStart {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolCallName")]
        tool_call_name: String,
        #[serde(default)]
        args: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Terminal marker for a tool call, and for the enclosing turn.
    #[serde(rename = "TOOL_CALL_END")]
    ToolCallEnd {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },

    /// Incremental state changes as RFC 6902 JSON Patch operations.
    #[serde(rename = "STATE_DELTA")]
    StateDelta {
        delta: Vec<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Result of decoding one raw transport object.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingEvent {
    /// One of the four event types the pipeline consumes.
    Known(AguiEvent),
    /// An event type outside the contract, forwarded verbatim.
    Passthrough(Value),
}

/// Errors produced while decoding raw transport objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("event is not a JSON object")]
    NotAnObject,

    #[error("event is missing the 'type' field")]
    MissingType,

    #[error("malformed '{kind}' event: {message}")]
    Malformed { kind: String, message: String },
}

/// Decode one raw transport object.
///
/// Unknown `type` tags are not errors: they decode to
/// [`IncomingEvent::Passthrough`] so the transcript side still sees them. A
/// known tag with a payload that fails validation is malformed and must be
/// dropped by the caller.
pub fn decode_event(raw: Value) -> Result<IncomingEvent, DecodeError> {
    let Some(object) = raw.as_object() else {
        return Err(DecodeError::NotAnObject);
    };
    let Some(kind) = object.get("type").and_then(Value::as_str) else {
        return Err(DecodeError::MissingType);
    };
    if !KNOWN_EVENT_TYPES.contains(&kind) {
        return Ok(IncomingEvent::Passthrough(raw));
    }

    let kind = kind.to_string();
    match serde_json::from_value::<AguiEvent>(raw) {
        Ok(event) => Ok(IncomingEvent::Known(event)),
        Err(err) => Err(DecodeError::Malformed {
            kind,
            message: err.to_string(),
        }),
    }
}

impl AguiEvent {
    /// The wire tag for this event.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Self::ToolCallStart { .. } => "TOOL_CALL_START",
            Self::ToolCallEnd { .. } => "TOOL_CALL_END",
            Self::StateDelta { .. } => "STATE_DELTA",
        }
    }

    /// Create a text-message-content event.
    pub fn text_message_content(message_id: impl Into<String>, delta: impl Into<String>) -> Self {
        Self::TextMessageContent {
            message_id: message_id.into(),
            delta: delta.into(),
            timestamp: None,
        }
    }

    /// Create a tool-call-start event.
    pub fn tool_call_start(
        tool_call_id: impl Into<String>,
        tool_call_name: impl Into<String>,
        args: Value,
    ) -> Self {
        Self::ToolCallStart {
            tool_call_id: tool_call_id.into(),
            tool_call_name: tool_call_name.into(),
            args,
            timestamp: None,
        }
    }

    /// Create a tool-call-end event.
    pub fn tool_call_end(tool_call_id: impl Into<String>) -> Self {
        Self::ToolCallEnd {
            tool_call_id: tool_call_id.into(),
            timestamp: None,
        }
    }

    /// Create a state-delta event.
    pub fn state_delta(delta: Vec<Value>) -> Self {
        Self::StateDelta {
            delta,
            timestamp: None,
        }
    }

    /// Stamp the event with an emission time.
    #[must_use]
    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        match &mut self {
            Self::TextMessageContent { timestamp, .. }
            | Self::ToolCallStart { timestamp, .. }
            | Self::ToolCallEnd { timestamp, .. }
            | Self::StateDelta { timestamp, .. } => *timestamp = Some(at),
        }
        self
    }
}

// === Unit Tests ===

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{AguiEvent, DecodeError, IncomingEvent, decode_event};

    #[test]
    fn decodes_text_message_content() {
        let raw = json!({
            "type": "TEXT_MESSAGE_CONTENT",
            "messageId": "m1",
            "delta": "Нет связи",
            "timestamp": "2025-03-01T10:15:30Z"
        });

        let decoded = decode_event(raw).expect("decode");
        let IncomingEvent::Known(event) = decoded else {
            panic!("expected a known event");
        };
        assert_eq!(event.kind(), "TEXT_MESSAGE_CONTENT");
        match event {
            AguiEvent::TextMessageContent {
                message_id,
                delta,
                timestamp,
            } => {
                assert_eq!(message_id, "m1");
                assert_eq!(delta, "Нет связи");
                assert!(timestamp.is_some());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn decodes_tool_call_pair() {
        let start = decode_event(json!({
            "type": "TOOL_CALL_START",
            "toolCallId": "t1",
            "toolCallName": "show_component",
            "args": { "type": "date-picker" }
        }))
        .expect("decode start");
        let end = decode_event(json!({
            "type": "TOOL_CALL_END",
            "toolCallId": "t1"
        }))
        .expect("decode end");

        assert!(matches!(
            start,
            IncomingEvent::Known(AguiEvent::ToolCallStart { .. })
        ));
        assert!(matches!(
            end,
            IncomingEvent::Known(AguiEvent::ToolCallEnd { .. })
        ));
    }

    #[test]
    fn unknown_type_passes_through_untouched() {
        let raw = json!({
            "type": "TEXT_MESSAGE_START",
            "messageId": "m1",
            "role": "assistant"
        });

        let decoded = decode_event(raw.clone()).expect("decode");
        assert_eq!(decoded, IncomingEvent::Passthrough(raw));
    }

    #[test]
    fn known_type_with_missing_field_is_malformed() {
        let raw = json!({
            "type": "TEXT_MESSAGE_CONTENT",
            "messageId": "m1"
        });

        let err = decode_event(raw).expect_err("should be malformed");
        assert!(matches!(err, DecodeError::Malformed { kind, .. } if kind == "TEXT_MESSAGE_CONTENT"));
    }

    #[test]
    fn non_object_and_untagged_events_are_rejected() {
        assert_eq!(
            decode_event(json!(["not", "an", "object"])),
            Err(DecodeError::NotAnObject)
        );
        assert_eq!(
            decode_event(json!({ "delta": "hello" })),
            Err(DecodeError::MissingType)
        );
    }

    #[test]
    fn events_round_trip_through_the_wire_format() {
        let event = AguiEvent::tool_call_start("t9", "show_component", json!({"type": "none"}));
        let raw = serde_json::to_value(&event).expect("serialize");

        assert_eq!(raw["type"], "TOOL_CALL_START");
        assert_eq!(raw["toolCallId"], "t9");
        let decoded = decode_event(raw).expect("decode");
        assert_eq!(decoded, IncomingEvent::Known(event));
    }
}
