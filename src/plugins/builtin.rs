//! Built-in keyword-triggered plugins.
//!
//! Every plugin the pipeline ships is a [`KeywordPlugin`]: a seed from the
//! configuration file compiled into a case-insensitive keyword matcher.
//! The default seeds cover the contact-center demo vocabulary.

use regex::Regex;
use serde_json::{Value, json};

use crate::config::PluginSeed;
use crate::intent::{IntentData, IntentKind};
use crate::registry::RegistryError;

use super::{RenderHandle, UiComponentPlugin};

/// Demo problem categories offered by the default `problem-buttons` plugin.
pub const INTERNET_PROBLEMS: [&str; 3] =
    ["Нет связи", "Медленный интернет", "Пропадает связь"];

/// A configuration-seeded plugin triggered by utterance keywords.
#[derive(Debug)]
pub struct KeywordPlugin {
    kind: IntentKind,
    matcher: Option<Regex>,
    options: Option<Vec<String>>,
    prompt: Option<String>,
    mock: Option<Value>,
}

impl KeywordPlugin {
    /// Compile a configuration seed into a plugin.
    ///
    /// Fails on out-of-vocabulary kinds and on the reserved `none` kind;
    /// both are configuration errors surfaced before any event flows.
    pub fn from_seed(seed: &PluginSeed) -> Result<Self, RegistryError> {
        let Some(kind) = IntentKind::parse(&seed.kind) else {
            return Err(RegistryError::UnknownKind {
                kind: seed.kind.clone(),
            });
        };
        if kind.is_none() {
            return Err(RegistryError::ReservedKind);
        }

        let matcher = if seed.keywords.is_empty() {
            None
        } else {
            let alternates = seed
                .keywords
                .iter()
                .map(|keyword| regex::escape(keyword))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!("(?i)({alternates})");
            Some(
                Regex::new(&pattern).map_err(|err| RegistryError::InvalidTrigger {
                    kind: seed.kind.clone(),
                    message: err.to_string(),
                })?,
            )
        };

        Ok(Self {
            kind,
            matcher,
            options: seed.options.clone(),
            prompt: seed.prompt.clone(),
            mock: seed.mock_data.clone(),
        })
    }

    /// Keyword list rendered back for diagnostics.
    #[must_use]
    pub fn trigger_pattern(&self) -> Option<&str> {
        self.matcher.as_ref().map(Regex::as_str)
    }
}

impl UiComponentPlugin for KeywordPlugin {
    fn kind(&self) -> IntentKind {
        self.kind
    }

    fn trigger(&self, utterance: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher.is_match(utterance),
            None => false,
        }
    }

    fn render_handle(&self) -> RenderHandle {
        RenderHandle::new(self.kind.as_str())
    }

    fn intent_data(&self) -> Option<IntentData> {
        let data = IntentData {
            options: self.options.clone(),
            prompt: self.prompt.clone(),
            extra: serde_json::Map::new(),
        };
        if data.is_empty() { None } else { Some(data) }
    }

    fn mock_data(&self) -> Option<Value> {
        self.mock.clone()
    }
}

/// Default plugin seeds for the contact-center demo deployment.
#[must_use]
pub fn default_seeds() -> Vec<PluginSeed> {
    vec![
        PluginSeed {
            kind: "problem-buttons".to_string(),
            // Stems, not full words: "связ" covers связь/связи/связью.
            keywords: vec![
                "связ".to_string(),
                "интернет".to_string(),
                "не работает".to_string(),
                "problem".to_string(),
            ],
            options: Some(INTERNET_PROBLEMS.iter().map(ToString::to_string).collect()),
            prompt: Some("Выберите категорию проблемы".to_string()),
            mock_data: Some(json!({ "options": INTERNET_PROBLEMS })),
        },
        PluginSeed {
            kind: "date-picker".to_string(),
            keywords: vec![
                "когда".to_string(),
                "дата".to_string(),
                "время".to_string(),
                "date".to_string(),
            ],
            options: None,
            prompt: Some("Укажите удобную дату".to_string()),
            mock_data: None,
        },
        PluginSeed {
            kind: "address-input".to_string(),
            keywords: vec![
                "адрес".to_string(),
                "улица".to_string(),
                "address".to_string(),
            ],
            options: None,
            prompt: Some("Укажите адрес подключения".to_string()),
            mock_data: None,
        },
    ]
}

// === Unit Tests ===
