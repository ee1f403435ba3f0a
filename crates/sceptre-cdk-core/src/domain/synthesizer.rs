//! Synthesizer configuration builder.
//!
//! Turns a validated [`DeploymentStrategy`] into the one synthesizer the
//! stack definition attaches to itself, and applies the strategy's side
//! effects to the CDK context.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::context::QUALIFIER_CONTEXT_KEY;
use crate::domain::strategy::{BootstraplessConfig, DeploymentStrategy};

/// Prefix of the environment variables read by the bootstrapless synthesizer
/// when it is configured from a CDK project rather than constructor kwargs.
pub const BOOTSTRAPLESS_ENV_PREFIX: &str = "BSS_";

/// Synthesizer handed to the stack definition's constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesizerConfig {
    /// `DefaultStackSynthesizer`. `None` keeps the SDK's default qualifier.
    Default { qualifier: Option<String> },
    /// `BootstraplessStackSynthesizer(**args)`.
    Bootstrapless { args: BootstraplessConfig },
}

impl SynthesizerConfig {
    /// Build the synthesizer for `strategy`, updating `context` in place.
    ///
    /// For bootstrapped stacks a qualifier already present in the context
    /// wins over `bootstrap_qualifier`; otherwise the argument is written
    /// into the context so that every construct sees the same qualifier.
    pub fn build(strategy: &DeploymentStrategy, context: &mut Map<String, Value>) -> Self {
        match strategy {
            DeploymentStrategy::Bootstrapped { qualifier } => {
                if let Some(existing) = context.get(QUALIFIER_CONTEXT_KEY) {
                    let qualifier = match existing {
                        Value::Null => None,
                        Value::String(s) => Some(s.clone()),
                        other => Some(other.to_string()),
                    };
                    return Self::Default { qualifier };
                }
                if let Some(q) = qualifier {
                    context.insert(QUALIFIER_CONTEXT_KEY.to_string(), Value::String(q.clone()));
                }
                Self::Default {
                    qualifier: qualifier.clone(),
                }
            }
            DeploymentStrategy::Bootstrapless(config) => Self::Bootstrapless {
                args: config.clone(),
            },
        }
    }

    /// `BSS_*` variables for external CDK projects.
    pub fn environment(&self) -> Vec<(String, String)> {
        match self {
            Self::Default { .. } => Vec::new(),
            Self::Bootstrapless { args } => args
                .entries()
                .into_iter()
                .map(|(key, value)| {
                    (
                        format!("{BOOTSTRAPLESS_ENV_PREFIX}{}", key.to_ascii_uppercase()),
                        value.to_string(),
                    )
                })
                .collect(),
        }
    }
}
