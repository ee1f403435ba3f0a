//! JSON schema of the handler arguments.

use serde_json::{Map, Value, json};

use crate::domain::strategy::BOOTSTRAPLESS_KEYS;

/// Schema for the `template:` block, as published to Sceptre.
pub fn handler_schema() -> Value {
    let bootstrapless: Map<String, Value> = BOOTSTRAPLESS_KEYS
        .iter()
        .map(|key| (key.to_string(), json!({"type": "string"})))
        .collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "type": {"type": "string", "enum": ["cdk"]},
            "path": {"type": "string"},
            "deployment_type": {
                "type": "string",
                "enum": ["bootstrapped", "bootstrapless"]
            },
            "bootstrap_qualifier": {"type": "string"},
            "context": {"type": "object"},
            "class_name": {"type": "string"},
            "stack_logical_id": {"type": "string"},
            "bootstrapless_config": {
                "type": "object",
                "additionalProperties": false,
                "properties": bootstrapless
            }
        },
        "required": ["path", "deployment_type"]
    })
}
