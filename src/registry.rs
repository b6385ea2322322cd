//! Plugin registry: the write-once mapping from intent kind to capability.
//!
//! The registry is populated from configuration at startup and immutable
//! afterward, so it can be shared behind an `Arc` and read from any task
//! without synchronization. Registering two plugins for the same kind fails
//! fast: silent overwrite would make the local strategy's first-match-wins
//! guarantee meaningless.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::config::PluginSeed;
use crate::intent::IntentKind;
use crate::plugins::{KeywordPlugin, UiComponentPlugin};

/// Errors raised while constructing the registry. All of them are fatal at
/// startup: the process must not consume events in an ambiguous state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate plugin registration for kind '{kind}'")]
    Duplicate { kind: String },

    #[error("unknown plugin kind '{kind}' in configuration")]
    UnknownKind { kind: String },

    #[error("the 'none' intent kind cannot have a plugin")]
    ReservedKind,

    #[error("invalid trigger for plugin '{kind}': {message}")]
    InvalidTrigger { kind: String, message: String },
}

/// Immutable registry of adaptive-UI plugins, in registration order.
pub struct PluginRegistry {
    order: Vec<Arc<dyn UiComponentPlugin>>,
    by_kind: HashMap<IntentKind, usize>,
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PluginRegistry {
    /// Look up the plugin registered for a kind.
    #[must_use]
    pub fn get(&self, kind: IntentKind) -> Option<&Arc<dyn UiComponentPlugin>> {
        self.by_kind.get(&kind).map(|&index| &self.order[index])
    }

    /// Whether a plugin is registered for the kind.
    #[must_use]
    pub fn contains(&self, kind: IntentKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    /// Plugins in registration order, for the local strategy's
    /// first-match-wins trigger evaluation.
    pub fn list_triggers(&self) -> impl Iterator<Item = &Arc<dyn UiComponentPlugin>> {
        self.order.iter()
    }

    /// Registered kinds in registration order.
    #[must_use]
    pub fn kinds(&self) -> Vec<IntentKind> {
        self.order.iter().map(|plugin| plugin.kind()).collect()
    }

    /// Mock fixture for a kind, for test harnesses without a classifier.
    #[must_use]
    pub fn mock_data(&self, kind: IntentKind) -> Option<Value> {
        self.get(kind).and_then(|plugin| plugin.mock_data())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Builder collecting plugins before the write-once freeze.
#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<Arc<dyn UiComponentPlugin>>,
}

impl PluginRegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. Order of calls is the registration order.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Arc<dyn UiComponentPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Compile and add configuration seeds in order.
    pub fn with_seeds(mut self, seeds: &[PluginSeed]) -> Result<Self, RegistryError> {
        for seed in seeds {
            self.plugins.push(Arc::new(KeywordPlugin::from_seed(seed)?));
        }
        Ok(self)
    }

    /// Freeze the registry. Fails on duplicate kinds.
    pub fn build(self) -> Result<PluginRegistry, RegistryError> {
        let mut by_kind = HashMap::with_capacity(self.plugins.len());
        for (index, plugin) in self.plugins.iter().enumerate() {
            let kind = plugin.kind();
            if kind.is_none() {
                return Err(RegistryError::ReservedKind);
            }
            if by_kind.insert(kind, index).is_some() {
                return Err(RegistryError::Duplicate {
                    kind: kind.as_str().to_string(),
                });
            }
        }
        Ok(PluginRegistry {
            order: self.plugins,
            by_kind,
        })
    }
}

/// Build the registry from configuration seeds.
pub fn build_registry(seeds: &[PluginSeed]) -> Result<PluginRegistry, RegistryError> {
    PluginRegistryBuilder::new().with_seeds(seeds)?.build()
}

// === Unit Tests ===
