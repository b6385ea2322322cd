//! Intent classification strategies.
//!
//! Given one finalized turn, a classifier produces exactly one
//! [`ComponentIntent`]. Two strategies exist, selected by configuration and
//! mutually exclusive per deployment:
//!
//! - `remote`: trust the agent runtime's tool-call mechanism; classification
//!   reduces to parsing the turn's captured tool-call arguments.
//! - `local`: fall back to the registry's trigger predicates, evaluated in
//!   registration order with first-match-wins semantics.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::turn::FinalizedTurn;
use crate::intent::{ComponentIntent, IntentData, IntentKind};
use crate::registry::PluginRegistry;

/// Classifier strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Remote,
    Local,
}

impl Strategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

/// Errors a classifier implementation may raise.
///
/// The built-in strategies degrade to `none` instead of failing; this type
/// exists for remote transports and test doubles. The engine treats any
/// error as `none` for the turn (logged, never surfaced to the end user).
#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    #[error("classification timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("classifier unavailable: {message}")]
    Unavailable { message: String },
}

impl ClassifyError {
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Maps one finalized turn to exactly one intent.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Strategy name for logs and diagnostics.
    fn name(&self) -> &'static str;

    async fn classify(&self, turn: FinalizedTurn) -> Result<ComponentIntent, ClassifyError>;
}

/// Parse tool-call arguments into an intent.
///
/// Out-of-vocabulary `type` values and malformed `data` payloads coerce to
/// `none`/absent with a warning; they are never a hard failure.
#[must_use]
pub fn parse_intent_args(args: &Value) -> ComponentIntent {
    let Some(kind_raw) = args.get("type").and_then(Value::as_str) else {
        warn!("tool call arguments carry no 'type'; treating as none");
        return ComponentIntent::none();
    };
    let Some(kind) = IntentKind::parse(kind_raw) else {
        warn!(kind = kind_raw, "out-of-vocabulary intent type; coercing to none");
        return ComponentIntent::none();
    };

    let data = match args.get("data") {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<IntentData>(value.clone()) {
            Ok(data) => Some(data),
            Err(err) => {
                warn!(error = %err, "unreadable intent data; dropping the payload");
                None
            }
        },
    };

    ComponentIntent { kind, data }
}

/// Remote strategy: the external runtime already classified the turn; parse
/// its tool-call arguments.
pub struct RemoteClassifier;

#[async_trait]
impl IntentClassifier for RemoteClassifier {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn classify(&self, turn: FinalizedTurn) -> Result<ComponentIntent, ClassifyError> {
        let Some(call) = turn.tool_call else {
            debug!("turn carries no tool call; no instruction");
            return Ok(ComponentIntent::none());
        };
        if !call.complete {
            warn!(id = %call.id, "turn closed before the tool call did; ignoring it");
            return Ok(ComponentIntent::none());
        }
        Ok(parse_intent_args(&call.args))
    }
}

/// Local fallback strategy: first registered plugin whose trigger matches
/// the utterance wins.
pub struct LocalClassifier {
    registry: Arc<PluginRegistry>,
}

impl LocalClassifier {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl IntentClassifier for LocalClassifier {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn classify(&self, turn: FinalizedTurn) -> Result<ComponentIntent, ClassifyError> {
        let utterance = turn.utterance.trim();
        if utterance.is_empty() {
            return Ok(ComponentIntent::none());
        }

        for plugin in self.registry.list_triggers() {
            if plugin.trigger(utterance) {
                let mut intent = ComponentIntent::new(plugin.kind());
                if let Some(data) = plugin.intent_data() {
                    intent = intent.with_data(data);
                }
                return Ok(intent);
            }
        }
        Ok(ComponentIntent::none())
    }
}

/// Instantiate the configured strategy.
#[must_use]
pub fn classifier_for(
    strategy: Strategy,
    registry: &Arc<PluginRegistry>,
) -> Arc<dyn IntentClassifier> {
    match strategy {
        Strategy::Remote => Arc::new(RemoteClassifier),
        Strategy::Local => Arc::new(LocalClassifier::new(Arc::clone(registry))),
    }
}

// === Unit Tests ===

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::config::PluginSeed;
    use crate::core::turn::{CapturedToolCall, FinalizedTurn, TurnBoundary};
    use crate::intent::{ComponentIntent, IntentKind};
    use crate::registry::build_registry;

    use super::{
        IntentClassifier, LocalClassifier, RemoteClassifier, parse_intent_args,
    };

    fn turn_with_utterance(utterance: &str) -> FinalizedTurn {
        FinalizedTurn {
            utterance: utterance.to_string(),
            state_deltas: Vec::new(),
            tool_call: None,
            boundary: TurnBoundary::Idle,
        }
    }

    fn turn_with_tool_call(args: serde_json::Value, complete: bool) -> FinalizedTurn {
        FinalizedTurn {
            utterance: String::new(),
            state_deltas: Vec::new(),
            tool_call: Some(CapturedToolCall {
                id: "t1".to_string(),
                name: "show_component".to_string(),
                args,
                complete,
            }),
            boundary: TurnBoundary::ToolCallEnd,
        }
    }

    fn seed(kind: &str, keywords: &[&str]) -> PluginSeed {
        PluginSeed {
            kind: kind.to_string(),
            keywords: keywords.iter().map(ToString::to_string).collect(),
            options: None,
            prompt: None,
            mock_data: None,
        }
    }

    #[test]
    fn parses_in_vocabulary_arguments() {
        let intent = parse_intent_args(&json!({
            "type": "problem-buttons",
            "data": { "options": ["Нет связи"] }
        }));

        assert_eq!(intent.kind, IntentKind::ProblemButtons);
        assert_eq!(
            intent.data.expect("data").options.as_deref(),
            Some(["Нет связи".to_string()].as_slice())
        );
    }

    #[test]
    fn out_of_vocabulary_type_coerces_to_none() {
        assert_eq!(
            parse_intent_args(&json!({"type": "unknown-xyz"})),
            ComponentIntent::none()
        );
        assert_eq!(parse_intent_args(&json!({})), ComponentIntent::none());
    }

    #[tokio::test]
    async fn remote_trusts_the_completed_tool_call() {
        let intent = RemoteClassifier
            .classify(turn_with_tool_call(json!({"type": "date-picker"}), true))
            .await
            .expect("classify");
        assert_eq!(intent.kind, IntentKind::DatePicker);
    }

    #[tokio::test]
    async fn remote_ignores_incomplete_tool_calls_and_bare_turns() {
        let dangling = RemoteClassifier
            .classify(turn_with_tool_call(json!({"type": "date-picker"}), false))
            .await
            .expect("classify");
        assert_eq!(dangling, ComponentIntent::none());

        let bare = RemoteClassifier
            .classify(turn_with_utterance("просто текст"))
            .await
            .expect("classify");
        assert_eq!(bare, ComponentIntent::none());
    }

    #[tokio::test]
    async fn local_first_match_wins_in_registration_order() {
        // Both triggers match the utterance; registration order decides.
        let registry = Arc::new(
            build_registry(&[
                seed("date-picker", &["интернет"]),
                seed("problem-buttons", &["интернет"]),
            ])
            .expect("registry"),
        );
        let classifier = LocalClassifier::new(registry);

        for _ in 0..3 {
            let intent = classifier
                .classify(turn_with_utterance("пропал интернет"))
                .await
                .expect("classify");
            assert_eq!(intent.kind, IntentKind::DatePicker);
        }
    }

    #[tokio::test]
    async fn local_returns_none_for_empty_or_unmatched_utterances() {
        let registry = Arc::new(
            build_registry(&[seed("problem-buttons", &["интернет"])]).expect("registry"),
        );
        let classifier = LocalClassifier::new(registry);

        let empty = classifier
            .classify(turn_with_utterance("   "))
            .await
            .expect("classify");
        assert_eq!(empty, ComponentIntent::none());

        let unmatched = classifier
            .classify(turn_with_utterance("спасибо, всё работает"))
            .await
            .expect("classify");
        assert_eq!(unmatched, ComponentIntent::none());
    }

    #[tokio::test]
    async fn local_attaches_the_plugin_payload() {
        let registry = Arc::new(
            build_registry(&[PluginSeed {
                kind: "problem-buttons".to_string(),
                keywords: vec!["связь".to_string()],
                options: Some(vec!["Нет связи".to_string()]),
                prompt: Some("Выберите проблему".to_string()),
                mock_data: None,
            }])
            .expect("registry"),
        );
        let classifier = LocalClassifier::new(registry);

        let intent = classifier
            .classify(turn_with_utterance("пропала связь"))
            .await
            .expect("classify");

        let data = intent.data.expect("payload");
        assert_eq!(data.options.as_deref(), Some(["Нет связи".to_string()].as_slice()));
        assert_eq!(data.prompt.as_deref(), Some("Выберите проблему"));
    }
}
