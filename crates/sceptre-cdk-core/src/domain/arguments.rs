//! Handler arguments as they appear in a Sceptre stack config.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::error::DomainError;
use crate::domain::stack_reference::StackDefinitionReference;
use crate::domain::strategy::DeploymentStrategy;

/// Value of the `type` key that routes a template block to this handler.
pub const HANDLER_TYPE: &str = "cdk";

/// Raw `template:` block. Unknown keys are rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerArguments {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub handler_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrapless_config: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_logical_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

/// Validated arguments, ready for loading and synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerPlan {
    pub reference: StackDefinitionReference,
    pub strategy: DeploymentStrategy,
    pub context: Map<String, Value>,
}

impl HandlerArguments {
    /// Validate every argument and resolve the stack path against
    /// `project_path`. Fails before anything is loaded or executed.
    pub fn into_plan(self, project_path: &Path) -> Result<HandlerPlan, DomainError> {
        if let Some(found) = self.handler_type.as_deref() {
            if found != HANDLER_TYPE {
                return Err(DomainError::InvalidHandlerType {
                    found: found.to_string(),
                });
            }
        }

        let path = required("path", self.path.as_deref())?;
        let deployment_type = required("deployment_type", self.deployment_type.as_deref())?;

        let strategy = DeploymentStrategy::from_arguments(
            deployment_type,
            self.bootstrap_qualifier.as_deref(),
            self.bootstrapless_config.as_ref(),
        )?;

        if let Some(class_name) = self.class_name.as_deref() {
            if !is_identifier(class_name) {
                return Err(DomainError::InvalidValue {
                    field: "class_name",
                    reason: format!("'{class_name}' is not a valid Python class name"),
                });
            }
        }
        if let Some(id) = self.stack_logical_id.as_deref() {
            if id.trim().is_empty() {
                return Err(DomainError::InvalidValue {
                    field: "stack_logical_id",
                    reason: "must not be empty".into(),
                });
            }
        }

        let reference = StackDefinitionReference::resolve(
            project_path,
            path,
            self.class_name.as_deref(),
            self.stack_logical_id.as_deref(),
        );
        if reference.is_project_descriptor() && self.class_name.is_some() {
            tracing::debug!("class_name is ignored for cdk.json projects");
        }
        Ok(HandlerPlan {
            reference,
            strategy,
            context: self.context.unwrap_or_default(),
        })
    }
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str, DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DomainError::MissingRequiredField { field }),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}
