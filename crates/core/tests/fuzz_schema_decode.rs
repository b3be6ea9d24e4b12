//! Fuzz testing for response-schema decoding.

#![allow(clippy::unwrap_used)]

use ami_core::{ActionSchema, ResponseSchema};
use proptest::prelude::*;
use serde_json::json;

fn probe_schema() -> ResponseSchema {
    ResponseSchema::from_variants(vec![ActionSchema::new(
        "echo",
        "Echo a message",
        json!({
            "type": "object",
            "properties": {"message": {"type": "string"}},
            "required": ["message"],
        }),
    )])
}

proptest! {
    #[test]
    fn test_decode_never_panics_on_arbitrary_strings(input in any::<String>()) {
        let schema = probe_schema();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&input) {
            // Either decodes or fails gracefully
            let _ = schema.decode(&value);
        }
    }

    #[test]
    fn test_decode_never_panics_on_partial_replies(
        reasoning in prop::option::of(prop::collection::vec(any::<String>(), 0..4)),
        tag in prop::option::of("[a-z_]{0,12}"),
    ) {
        let schema = probe_schema();
        let mut reply = json!({});
        if let Some(thoughts) = reasoning {
            reply["reasoning"] = json!(thoughts);
        }
        if let Some(tag) = tag {
            reply["action"] = json!({"type": tag, "message": "hi"});
        }
        // Should not panic
        let _ = schema.decode(&reply);
    }

    #[test]
    fn test_decode_accepts_all_wellformed_replies(
        thoughts in prop::collection::vec(".*", 1..4),
        message in ".*",
    ) {
        let schema = probe_schema();
        let reply = schema.decode(&json!({
            "reasoning": &thoughts,
            "action": {"type": "echo", "message": message},
        })).unwrap();
        prop_assert_eq!(reply.reasoning.len(), thoughts.len());
        prop_assert_eq!(reply.action.tag.as_str(), "echo");
    }
}

#[test]
fn test_decode_rejects_numeric_reasoning_entries() {
    let schema = probe_schema();
    let result = schema.decode(&json!({
        "reasoning": [1, 2],
        "action": {"type": "echo", "message": "hi"},
    }));
    assert!(result.is_err());
}

#[test]
fn test_decode_rejects_array_action() {
    let schema = probe_schema();
    let result = schema.decode(&json!({
        "reasoning": ["ok"],
        "action": [{"type": "echo"}],
    }));
    assert!(result.is_err());
}
