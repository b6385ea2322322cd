//! Test utilities for agui-panel tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Create a temporary directory for testing
pub fn temp_dir() -> Result<PathBuf, std::io::Error> {
    let temp = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = temp.join(format!("agui-panel-test-{}-{}", std::process::id(), nanos));
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Write a minimal panel config file for testing
pub fn create_test_config(dir: &Path, strategy: &str) -> Result<PathBuf, std::io::Error> {
    let config_path = dir.join("agui-panel").join("config.toml");
    fs::create_dir_all(config_path.parent().unwrap())?;

    let content = format!(
        r#"[classifier]
strategy = "{strategy}"

[[plugin]]
kind = "problem-buttons"
keywords = ["связь", "интернет"]
options = ["Нет связи", "Медленный интернет", "Пропадает связь"]
"#
    );

    fs::write(&config_path, content)?;
    Ok(config_path)
}

/// One recorded AG-UI turn as NDJSON lines
pub fn sample_turn_ndjson() -> String {
    [
        r#"{"type":"TEXT_MESSAGE_CONTENT","messageId":"m1","delta":"У клиента "}"#,
        r#"{"type":"TEXT_MESSAGE_CONTENT","messageId":"m1","delta":"пропал интернет"}"#,
        r#"{"type":"TOOL_CALL_START","toolCallId":"t1","toolCallName":"show_component","args":{"type":"problem-buttons","data":{"options":["Нет связи"]}}}"#,
        r#"{"type":"TOOL_CALL_END","toolCallId":"t1"}"#,
    ]
    .join("\n")
}
