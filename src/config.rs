//! Configuration loading and defaults for agui-panel.
//!
//! The registry seed list, classifier strategy and pipeline timing all come
//! from one TOML file, resolved in order: explicit `--config` path, the
//! `AGUI_PANEL_CONFIG` environment variable, the user config directory,
//! built-in defaults. The resolved configuration is constructed once at
//! startup and threaded through constructors; nothing reads it ambiently.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::classifier::Strategy;
use crate::core::engine::EngineConfig;
use crate::plugins::default_seeds;

// === Types ===

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "AGUI_PANEL_CONFIG";

/// Environment variable overriding the classifier strategy.
pub const STRATEGY_ENV: &str = "AGUI_PANEL_STRATEGY";

const DEFAULT_CLASSIFY_TIMEOUT_MS: u64 = 3000;
const DEFAULT_IDLE_WINDOW_MS: u64 = 1500;

/// One plugin entry from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginSeed {
    /// Intent kind this plugin serves; must be unique across entries.
    pub kind: String,

    /// Keywords for the local strategy's trigger predicate.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Ordered options attached to intents for this plugin.
    #[serde(default)]
    pub options: Option<Vec<String>>,

    /// Prompt text attached to intents for this plugin.
    #[serde(default)]
    pub prompt: Option<String>,

    /// Fixture for exercising the panel without a live classifier.
    #[serde(default)]
    pub mock_data: Option<Value>,
}

/// Raw `[classifier]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassifierSection {
    pub strategy: Option<Strategy>,
    pub timeout_ms: Option<u64>,
}

/// Raw `[ingress]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngressSection {
    pub idle_window_ms: Option<u64>,
}

/// Raw configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub classifier: ClassifierSection,

    #[serde(default)]
    pub ingress: IngressSection,

    #[serde(default, rename = "plugin")]
    pub plugins: Vec<PluginSeed>,
}

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Defaults,
    File(PathBuf),
}

/// Resolved configuration with defaults and environment overrides applied.
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: Strategy,
    pub classify_timeout: Duration,
    pub idle_window: Duration,
    pub plugins: Vec<PluginSeed>,
    pub source: ConfigSource,
}

impl Config {
    /// Load configuration, resolving the file path as documented on the
    /// module.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let (file, source) = match resolve_path(explicit_path) {
            Some(path) => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                let file: ConfigFile = toml::from_str(&text)
                    .with_context(|| format!("failed to parse config file: {}", path.display()))?;
                (file, ConfigSource::File(path))
            }
            None => (ConfigFile::default(), ConfigSource::Defaults),
        };
        Ok(Self::resolve(file, source))
    }

    /// Apply defaults and environment overrides to raw file contents.
    #[must_use]
    pub fn resolve(file: ConfigFile, source: ConfigSource) -> Self {
        let mut strategy = file.classifier.strategy.unwrap_or_default();
        if let Ok(value) = env::var(STRATEGY_ENV) {
            match value.as_str() {
                "remote" => strategy = Strategy::Remote,
                "local" => strategy = Strategy::Local,
                other => warn!(value = other, "ignoring unknown {STRATEGY_ENV} value"),
            }
        }

        let plugins = if file.plugins.is_empty() {
            default_seeds()
        } else {
            file.plugins
        };

        Self {
            strategy,
            classify_timeout: Duration::from_millis(
                file.classifier
                    .timeout_ms
                    .unwrap_or(DEFAULT_CLASSIFY_TIMEOUT_MS),
            ),
            idle_window: Duration::from_millis(
                file.ingress
                    .idle_window_ms
                    .unwrap_or(DEFAULT_IDLE_WINDOW_MS),
            ),
            plugins,
            source,
        }
    }

    /// Engine timing derived from this configuration.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            idle_window: self.idle_window,
            classify_timeout: self.classify_timeout,
        }
    }
}

/// Pick the config file to read, if any.
fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    let default = dirs::config_dir()?.join("agui-panel").join("config.toml");
    default.exists().then_some(default)
}

// === Unit Tests ===
