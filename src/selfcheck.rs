//! Structured startup self-check.
//!
//! Validates the pieces the pipeline needs before consuming events:
//! configuration, registry construction, strategy sanity and the wire
//! format. The report is returned as data and rendered separately, so a
//! process supervisor can act on the pass/fail result instead of scraping
//! log output.

use colored::Colorize;
use serde_json::json;

use crate::classifier::Strategy;
use crate::config::{Config, ConfigSource};
use crate::protocol::{self, AguiEvent, IncomingEvent};
use crate::registry::build_registry;

/// Outcome of one diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Error,
}

/// One diagnostic check result with status and optional hint.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: Status,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    fn ok(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: Status::Ok,
            message: message.into(),
            hint: None,
        }
    }

    fn warning(name: &'static str, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: Status::Warning,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    fn error(name: &'static str, message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: Status::Error,
            message: message.into(),
            hint: Some(hint.into()),
        }
    }
}

/// Full self-check report.
#[derive(Debug, Clone)]
pub struct SelfCheckReport {
    pub checks: Vec<CheckResult>,
}

impl SelfCheckReport {
    /// Whether the process may start consuming events.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status != Status::Error)
    }

    /// Human-readable, colored rendering of the report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for check in &self.checks {
            let marker = match check.status {
                Status::Ok => "ok".green().bold(),
                Status::Warning => "warn".yellow().bold(),
                Status::Error => "fail".red().bold(),
            };
            out.push_str(&format!("  {marker}  {}: {}\n", check.name, check.message));
            if let Some(hint) = &check.hint {
                out.push_str(&format!("          hint: {hint}\n"));
            }
        }
        let verdict = if self.passed() {
            "self-check passed".green().bold().to_string()
        } else {
            "self-check failed".red().bold().to_string()
        };
        out.push_str(&verdict);
        out.push('\n');
        out
    }
}

/// Run all startup checks against a resolved configuration.
#[must_use]
pub fn run_self_check(config: &Config) -> SelfCheckReport {
    SelfCheckReport {
        checks: vec![
            check_config_source(config),
            check_registry(config),
            check_strategy(config),
            check_wire_format(),
        ],
    }
}

fn check_config_source(config: &Config) -> CheckResult {
    match &config.source {
        ConfigSource::Defaults => {
            CheckResult::ok("configuration", "built-in defaults (no config file found)")
        }
        ConfigSource::File(path) => {
            CheckResult::ok("configuration", format!("loaded from {}", path.display()))
        }
    }
}

fn check_registry(config: &Config) -> CheckResult {
    match build_registry(&config.plugins) {
        Ok(registry) if registry.is_empty() => CheckResult::warning(
            "registry",
            "no plugins registered; every intent will be unresolvable",
            "add [[plugin]] entries to the config file",
        ),
        Ok(registry) => {
            let kinds = registry
                .kinds()
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            CheckResult::ok(
                "registry",
                format!("{} plugin(s) registered: {kinds}", registry.len()),
            )
        }
        Err(err) => CheckResult::error(
            "registry",
            err.to_string(),
            "fix the [[plugin]] entries; the pipeline will not start in this state",
        ),
    }
}

fn check_strategy(config: &Config) -> CheckResult {
    match config.strategy {
        Strategy::Remote => CheckResult::ok(
            "classifier",
            "remote strategy: trusting the agent runtime's tool calls",
        ),
        Strategy::Local => {
            let triggerless: Vec<&str> = config
                .plugins
                .iter()
                .filter(|seed| seed.keywords.is_empty())
                .map(|seed| seed.kind.as_str())
                .collect();
            if triggerless.is_empty() {
                CheckResult::ok("classifier", "local strategy: all plugins carry triggers")
            } else {
                CheckResult::warning(
                    "classifier",
                    format!(
                        "local strategy, but these plugins have no keywords: {}",
                        triggerless.join(", ")
                    ),
                    "they can never be selected by the local fallback",
                )
            }
        }
    }
}

/// Round-trip one event through the wire format. Replaces the old
/// print-and-forget "library installed" probe with a check the supervisor
/// can consume.
fn check_wire_format() -> CheckResult {
    let event = AguiEvent::tool_call_start("probe", "show_component", json!({"type": "none"}))
        .with_timestamp(chrono::Utc::now());
    let encoded = match serde_json::to_value(&event) {
        Ok(value) => value,
        Err(err) => {
            return CheckResult::error(
                "wire format",
                format!("failed to encode a probe event: {err}"),
                "this build cannot speak the AG-UI wire format",
            );
        }
    };
    match protocol::decode_event(encoded) {
        Ok(IncomingEvent::Known(decoded)) if decoded == event => {
            CheckResult::ok("wire format", "probe event round-tripped")
        }
        other => CheckResult::error(
            "wire format",
            format!("probe event did not round-trip: {other:?}"),
            "this build cannot speak the AG-UI wire format",
        ),
    }
}

// === Unit Tests ===

#[cfg(test)]
mod tests {
    use crate::config::{Config, ConfigFile, ConfigSource, PluginSeed};

    use super::{Status, run_self_check};

    fn config_with_plugins(plugins: Vec<PluginSeed>) -> Config {
        let mut config = Config::resolve(ConfigFile::default(), ConfigSource::Defaults);
        config.plugins = plugins;
        config
    }

    fn seed(kind: &str) -> PluginSeed {
        PluginSeed {
            kind: kind.to_string(),
            keywords: vec!["x".to_string()],
            options: None,
            prompt: None,
            mock_data: None,
        }
    }

    #[test]
    fn default_configuration_passes() {
        let config = Config::resolve(ConfigFile::default(), ConfigSource::Defaults);
        let report = run_self_check(&config);
        assert!(report.passed(), "{}", report.render());
    }

    #[test]
    fn duplicate_plugins_fail_the_check() {
        let config = config_with_plugins(vec![seed("date-picker"), seed("date-picker")]);
        let report = run_self_check(&config);

        assert!(!report.passed());
        let registry_check = report
            .checks
            .iter()
            .find(|check| check.name == "registry")
            .expect("registry check");
        assert_eq!(registry_check.status, Status::Error);
    }

    #[test]
    fn local_strategy_without_triggers_warns() {
        let mut config = config_with_plugins(vec![PluginSeed {
            kind: "date-picker".to_string(),
            keywords: Vec::new(),
            options: None,
            prompt: None,
            mock_data: None,
        }]);
        config.strategy = crate::classifier::Strategy::Local;

        let report = run_self_check(&config);

        assert!(report.passed(), "warnings are not failures");
        let classifier_check = report
            .checks
            .iter()
            .find(|check| check.name == "classifier")
            .expect("classifier check");
        assert_eq!(classifier_check.status, Status::Warning);
    }
}
