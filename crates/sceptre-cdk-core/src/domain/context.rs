//! Per-invocation synthesis inputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// CDK context key that selects the bootstrap stack qualifier.
pub const QUALIFIER_CONTEXT_KEY: &str = "@aws-cdk/core:bootstrapQualifier";

/// A deploy-time stack parameter. Sceptre only hands over strings or lists
/// of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Single(String),
    List(Vec<String>),
}

/// Everything handed to the stack definition besides its synthesizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SynthesisContext {
    /// Forwarded verbatim to the CDK app.
    pub context: Map<String, Value>,
    /// Deploy-time parameters.
    pub parameters: BTreeMap<String, ParameterValue>,
    /// Compile-time `sceptre_user_data`.
    pub user_data: Value,
}

impl SynthesisContext {
    pub fn new(
        context: Map<String, Value>,
        parameters: BTreeMap<String, ParameterValue>,
        user_data: Value,
    ) -> Self {
        Self {
            context,
            parameters,
            user_data,
        }
    }

    /// `key=value` pairs for `cdk synth --context`. Strings are passed as-is,
    /// everything else JSON-encoded.
    pub fn context_flags(&self) -> Vec<String> {
        self.context
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
            .collect()
    }

    pub fn has_user_data(&self) -> bool {
        match &self.user_data {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }
}
