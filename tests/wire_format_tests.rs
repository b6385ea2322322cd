//! Wire-format fixture tests.
//!
//! Assert the recorded NDJSON shape the replay driver consumes: one JSON
//! object per line, tagged by `type`, camelCase payload fields.

mod common;

use serde_json::Value;

#[test]
fn sample_turn_lines_are_tagged_json_objects() {
    let ndjson = common::sample_turn_ndjson();

    let mut tags = Vec::new();
    for line in ndjson.lines() {
        let value: Value = serde_json::from_str(line).expect("each line is JSON");
        let object = value.as_object().expect("each line is an object");
        tags.push(object["type"].as_str().expect("tagged").to_string());
    }

    assert_eq!(
        tags,
        [
            "TEXT_MESSAGE_CONTENT",
            "TEXT_MESSAGE_CONTENT",
            "TOOL_CALL_START",
            "TOOL_CALL_END"
        ]
    );
}

#[test]
fn tool_call_start_carries_intent_arguments() {
    let ndjson = common::sample_turn_ndjson();
    let start_line = ndjson
        .lines()
        .find(|line| line.contains("TOOL_CALL_START"))
        .expect("fixture has a tool call");

    let value: Value = serde_json::from_str(start_line).expect("JSON");
    assert_eq!(value["toolCallId"].as_str(), Some("t1"));
    assert_eq!(value["toolCallName"].as_str(), Some("show_component"));
    assert_eq!(value["args"]["type"].as_str(), Some("problem-buttons"));
    assert_eq!(
        value["args"]["data"]["options"][0].as_str(),
        Some("Нет связи")
    );
}
