//! Component intents resolved from operator/customer turns.
//!
//! An intent is the classifier's verdict on one finalized turn: which
//! adaptive control, if any, the panel should show next.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The closed set of adaptive controls the pipeline knows how to direct.
///
/// Out-of-vocabulary values never reach this type: the classifier coerces
/// them to [`IntentKind::None`] with a warning at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentKind {
    ProblemButtons,
    DatePicker,
    AddressInput,
    None,
}

impl IntentKind {
    /// Wire spelling of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProblemButtons => "problem-buttons",
            Self::DatePicker => "date-picker",
            Self::AddressInput => "address-input",
            Self::None => "none",
        }
    }

    /// Parse a wire spelling; `None` (the Option) means out-of-vocabulary.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "problem-buttons" => Some(Self::ProblemButtons),
            "date-picker" => Some(Self::DatePicker),
            "address-input" => Some(Self::AddressInput),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Whether this is the "no panel change" intent.
    #[must_use]
    pub fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload accompanying an intent, forwarded to the rendered component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentData {
    /// Ordered selectable options (e.g. problem categories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    /// Prompt text shown to the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Implementation-defined extra keys, carried verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IntentData {
    /// Data consisting of an ordered option list.
    #[must_use]
    pub fn with_options(options: Vec<String>) -> Self {
        Self {
            options: Some(options),
            ..Self::default()
        }
    }

    /// Whether the payload carries nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_none() && self.prompt.is_none() && self.extra.is_empty()
    }
}

/// A resolved directive for what (if any) adaptive UI to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentIntent {
    #[serde(rename = "type")]
    pub kind: IntentKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<IntentData>,
}

impl ComponentIntent {
    /// The "no new instruction" intent.
    #[must_use]
    pub fn none() -> Self {
        Self {
            kind: IntentKind::None,
            data: None,
        }
    }

    /// An intent for the given kind with no payload.
    #[must_use]
    pub fn new(kind: IntentKind) -> Self {
        Self { kind, data: None }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_data(mut self, data: IntentData) -> Self {
        self.data = Some(data);
        self
    }
}

// === Unit Tests ===

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{ComponentIntent, IntentData, IntentKind};

    #[test]
    fn kind_spelling_round_trips() {
        for kind in [
            IntentKind::ProblemButtons,
            IntentKind::DatePicker,
            IntentKind::AddressInput,
            IntentKind::None,
        ] {
            assert_eq!(IntentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(IntentKind::parse("unknown-xyz"), None);
    }

    #[test]
    fn intent_deserializes_from_tool_arguments() {
        let intent: ComponentIntent = serde_json::from_value(json!({
            "type": "problem-buttons",
            "data": {
                "options": ["Нет связи", "Медленный интернет"],
                "prompt": "Выберите проблему",
                "severity": "high"
            }
        }))
        .expect("deserialize");

        assert_eq!(intent.kind, IntentKind::ProblemButtons);
        let data = intent.data.expect("data");
        assert_eq!(
            data.options.as_deref(),
            Some(["Нет связи".to_string(), "Медленный интернет".to_string()].as_slice())
        );
        assert_eq!(data.prompt.as_deref(), Some("Выберите проблему"));
        assert_eq!(data.extra.get("severity"), Some(&json!("high")));
    }

    #[test]
    fn none_intent_has_no_payload() {
        let intent = ComponentIntent::none();
        assert!(intent.kind.is_none());
        assert!(intent.data.is_none());
    }

    #[test]
    fn empty_data_is_detected() {
        assert!(IntentData::default().is_empty());
        assert!(!IntentData::with_options(vec!["a".into()]).is_empty());
    }
}
