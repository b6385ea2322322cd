//! Adaptive panel controller.
//!
//! The panel owns the single slot of adaptive UI. It moves between three
//! phases: Empty (nothing shown), Active (exactly one component shown) and
//! Error (the last intent failed to resolve). Errors never blank a working
//! panel: a previously visible component stays up while the failure is
//! reported through `last_error`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::intent::{ComponentIntent, IntentData, IntentKind};
use crate::registry::PluginRegistry;

/// One live, displayed adaptive control.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiComponent {
    /// Stable per-instance id, used as the re-render key.
    pub id: String,

    /// Foreign key into the plugin registry.
    #[serde(rename = "type")]
    pub kind: IntentKind,

    /// Props forwarded verbatim to the renderable.
    pub props: Map<String, Value>,

    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

/// Panel display phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPhase {
    #[default]
    Empty,
    Active,
    Error,
}

/// Failure recorded when an intent cannot be resolved to a plugin.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PanelError {
    #[error("no plugin registered for intent kind '{kind}'")]
    UnresolvedIntent { kind: IntentKind, at: DateTime<Utc> },
}

impl PanelError {
    /// When the failure was recorded.
    #[must_use]
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::UnresolvedIntent { at, .. } => *at,
        }
    }
}

/// Outcome of applying one intent, reported to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// A `none` intent mid-conversation: no new instruction, state kept.
    Unchanged,
    /// The intent resolved; a fresh component now occupies the slot.
    Shown(UiComponent),
    /// The intent kind has no registered plugin; prior component kept.
    Rejected(PanelError),
}

/// Owns the currently displayed component and applies classifier output.
///
/// All mutation goes through the single engine loop, so callers observe
/// state transitions atomically.
pub struct PanelController {
    registry: Arc<PluginRegistry>,
    current: Option<UiComponent>,
    last_error: Option<PanelError>,
    phase: PanelPhase,
}

impl PanelController {
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            current: None,
            last_error: None,
            phase: PanelPhase::Empty,
        }
    }

    /// Apply one resolved intent.
    ///
    /// `none` is "no new instruction", not "clear": the panel only empties
    /// through [`PanelController::clear`].
    pub fn apply(&mut self, intent: ComponentIntent) -> ApplyOutcome {
        if intent.kind.is_none() {
            return ApplyOutcome::Unchanged;
        }

        if !self.registry.contains(intent.kind) {
            let error = PanelError::UnresolvedIntent {
                kind: intent.kind,
                at: Utc::now(),
            };
            self.last_error = Some(error.clone());
            self.phase = PanelPhase::Error;
            return ApplyOutcome::Rejected(error);
        }

        let component = UiComponent {
            id: uuid::Uuid::new_v4().to_string(),
            kind: intent.kind,
            props: props_from_data(intent.data),
            timestamp: Utc::now(),
        };
        self.current = Some(component.clone());
        self.last_error = None;
        self.phase = PanelPhase::Active;
        ApplyOutcome::Shown(component)
    }

    /// Explicit reset: retire the current component and forget errors.
    pub fn clear(&mut self) {
        self.current = None;
        self.last_error = None;
        self.phase = PanelPhase::Empty;
    }

    /// The component occupying the slot, if any.
    #[must_use]
    pub fn current(&self) -> Option<&UiComponent> {
        self.current.as_ref()
    }

    /// The most recent resolution failure, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&PanelError> {
        self.last_error.as_ref()
    }

    #[must_use]
    pub fn phase(&self) -> PanelPhase {
        self.phase
    }
}

/// Derive component props from the intent payload: recognized keys first,
/// extra keys verbatim.
fn props_from_data(data: Option<IntentData>) -> Map<String, Value> {
    let mut props = Map::new();
    let Some(data) = data else {
        return props;
    };
    if let Some(options) = data.options {
        props.insert("options".to_string(), Value::from(options));
    }
    if let Some(prompt) = data.prompt {
        props.insert("prompt".to_string(), Value::String(prompt));
    }
    for (key, value) in data.extra {
        props.insert(key, value);
    }
    props
}

// === Unit Tests ===
