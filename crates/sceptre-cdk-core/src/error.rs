//! Unified error handling for the handler core.
//!
//! Every failure belongs to exactly one [`Stage`] so operators can tell a
//! broken template apart from a failed upload.

use std::fmt;

use thiserror::Error;

use crate::application::{ApplicationError, TemplateBody};
use crate::domain::DomainError;

/// Root error type for handler operations.
#[derive(Debug, Error, Clone)]
pub enum HandlerError {
    /// Invalid or conflicting handler arguments.
    #[error("configuration failed: {0}")]
    Domain(#[from] DomainError),

    /// Loading, synthesis or publishing failed.
    #[error("{stage} failed: {0}", stage = .0.stage())]
    Application(#[from] ApplicationError),

    /// Publishing failed after the template was synthesized. The template
    /// is still valid and is kept here.
    #[error("publishing failed: {source}")]
    Publishing {
        #[source]
        source: ApplicationError,
        template: TemplateBody,
    },

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl HandlerError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) | Self::Publishing { source: e, .. } => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in the CDK handler".into(),
                "Please report this issue at: https://github.com/sceptre/sceptre-cdk-handler/issues"
                    .into(),
            ],
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Domain(_) => Stage::Configuration,
            Self::Application(e) => e.stage(),
            Self::Publishing { .. } => Stage::Publishing,
            Self::Internal { .. } => Stage::Internal,
        }
    }

    /// The synthesized template, when only publishing failed.
    pub fn template(&self) -> Option<&TemplateBody> {
        match self {
            Self::Publishing { template, .. } => Some(template),
            _ => None,
        }
    }

    /// Keep `template` on a publishing-stage failure.
    pub(crate) fn with_template(self, template: &TemplateBody) -> Self {
        match self {
            Self::Application(source) if source.stage() == Stage::Publishing => {
                Self::Publishing {
                    source,
                    template: template.clone(),
                }
            }
            other => other,
        }
    }
}

/// Handler stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Configuration,
    Load,
    Synthesis,
    Publishing,
    Internal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configuration => "configuration",
            Self::Load => "load",
            Self::Synthesis => "synthesis",
            Self::Publishing => "publishing",
            Self::Internal => "handler",
        })
    }
}

/// Convenient result type alias.
pub type HandlerResult<T> = Result<T, HandlerError>;
