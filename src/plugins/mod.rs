//! Adaptive-UI component plugins.
//!
//! A plugin pairs an intent kind with a fallback trigger predicate, an
//! opaque render handle, and optional mock data for offline testing. The
//! pipeline treats plugins as capabilities: it decides *which* one to show,
//! never *how* it renders.

#![allow(dead_code)]

// === Modules ===

pub mod builtin;

// === Re-exports ===

pub use builtin::{INTERNET_PROBLEMS, KeywordPlugin, default_seeds};

use serde_json::Value;

use crate::intent::{IntentData, IntentKind};

/// Opaque handle to UI-layer code.
///
/// The pipeline never inspects the handle; it is forwarded verbatim to
/// whichever renderer consumes panel snapshots, which resolves it to a
/// concrete view implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderHandle(String);

impl RenderHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A statically registered adaptive-UI capability.
///
/// Implementations must be pure with respect to `trigger`: same utterance,
/// same answer, so first-match-wins stays deterministic.
pub trait UiComponentPlugin: Send + Sync {
    /// Registry key; unique across all registered plugins.
    fn kind(&self) -> IntentKind;

    /// Fallback predicate over the latest utterance, used only by the
    /// local classification strategy.
    fn trigger(&self, utterance: &str) -> bool;

    /// Handle to the renderable implementation.
    fn render_handle(&self) -> RenderHandle;

    /// Payload the local strategy attaches to intents for this plugin.
    fn intent_data(&self) -> Option<IntentData> {
        None
    }

    /// Fixture for exercising the panel without a live classifier.
    fn mock_data(&self) -> Option<Value> {
        None
    }
}
