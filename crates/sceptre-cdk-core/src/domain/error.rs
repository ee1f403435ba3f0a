// ============================================================================
// domain/error.rs - HANDLER ARGUMENT ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// Every variant here depends only on the handler arguments (or on the
/// shape of a synthesized assembly), never on process execution, so all of
/// them are reported as configuration failures.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Argument validation
    // ========================================================================
    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    #[error("Invalid stack config: {reason}")]
    InvalidStackConfig { reason: String },

    #[error("Invalid handler type '{found}': expected 'cdk'")]
    InvalidHandlerType { found: String },

    #[error("Invalid deployment_type '{found}': expected 'bootstrapped' or 'bootstrapless'")]
    InvalidDeploymentType { found: String },

    #[error("'{field}' cannot be used with deployment_type '{deployment_type}'")]
    ConflictingStrategy {
        field: &'static str,
        deployment_type: &'static str,
    },

    #[error("Unrecognised bootstrapless_config key: '{key}'")]
    UnknownBootstraplessKey { key: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    // ========================================================================
    // Stack selection
    // ========================================================================
    #[error("Stack '{id}' not found in cloud assembly (available: {available})")]
    StackNotInAssembly { id: String, available: String },

    #[error("Cloud assembly contains several stacks ({available}); set stack_logical_id")]
    AmbiguousStack { available: String },

    #[error("Cloud assembly contains no stacks")]
    NoStacksInAssembly,
}

impl DomainError {
    /// The handler argument this error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field }
            | Self::ConflictingStrategy { field, .. }
            | Self::InvalidValue { field, .. } => Some(field),
            Self::InvalidHandlerType { .. } => Some("type"),
            Self::InvalidDeploymentType { .. } => Some("deployment_type"),
            Self::UnknownBootstraplessKey { .. } => Some("bootstrapless_config"),
            Self::StackNotInAssembly { .. }
            | Self::AmbiguousStack { .. }
            | Self::NoStacksInAssembly => Some("stack_logical_id"),
            Self::InvalidStackConfig { .. } => None,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::MissingRequiredField { field } => vec![
                format!("Add '{}' to the template block of the stack config", field),
                "Run 'sceptre-cdk schema' to see every recognised argument".into(),
            ],
            Self::InvalidStackConfig { .. } => vec![
                "The stack config must be a YAML mapping with a 'template' block".into(),
                "Run 'sceptre-cdk schema' to see every recognised argument".into(),
            ],
            Self::InvalidDeploymentType { .. } => vec![
                "Use 'bootstrapped' when the account has a CDK bootstrap stack".into(),
                "Use 'bootstrapless' to name the asset bucket and repository explicitly".into(),
            ],
            Self::ConflictingStrategy { field, .. } => vec![
                format!("Remove '{}' or switch deployment_type", field),
                "bootstrap_qualifier only applies to 'bootstrapped'".into(),
                "bootstrapless_config only applies to 'bootstrapless'".into(),
            ],
            Self::UnknownBootstraplessKey { key } => vec![
                format!("'{}' is not a bootstrapless synthesizer setting", key),
                format!("Recognised keys: {}", crate::domain::BOOTSTRAPLESS_KEYS.join(", ")),
            ],
            Self::StackNotInAssembly { available, .. } | Self::AmbiguousStack { available } => {
                vec![format!("Set stack_logical_id to one of: {}", available)]
            }
            _ => vec!["See the handler documentation for more details".into()],
        }
    }
}
