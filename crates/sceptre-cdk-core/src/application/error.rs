//! Application layer errors.
//!
//! These errors come from loading, running and publishing, not from the
//! handler arguments themselves. Argument errors are `DomainError` from
//! `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::Stage;

/// Errors that occur while orchestrating a synthesis.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    /// The stack definition file does not exist.
    #[error("Stack definition not found: {path}")]
    ModuleNotFound { path: PathBuf },

    /// The stack definition exists but could not be read.
    #[error("Cannot read stack definition {path}: {reason}")]
    ModuleUnreadable { path: PathBuf, reason: String },

    /// The module does not define the requested class.
    #[error("No class named '{class_name}' in {path}")]
    ClassNotFound { class_name: String, path: PathBuf },

    /// The synthesis command failed or exited non-zero.
    #[error("CDK synthesis failed ({command}, exit status {status}){}", render_output(.output))]
    SynthesisFailed {
        command: String,
        status: String,
        output: String,
    },

    /// Synthesis succeeded but produced an assembly this handler cannot read.
    #[error("Invalid cloud assembly at {path}: {reason}")]
    AssemblyInvalid { path: PathBuf, reason: String },

    /// The publishing command failed or exited non-zero.
    #[error("Publishing CDK assets failed ({command}, exit status {status}){}", render_output(.output))]
    PublishFailed {
        command: String,
        status: String,
        output: String,
    },

    /// The asset manifest could not be read.
    #[error("Invalid asset manifest at {path}: {reason}")]
    AssetManifestInvalid { path: PathBuf, reason: String },

    /// Session credentials could not be obtained for publishing.
    #[error("Session credentials unavailable: {reason}")]
    SessionUnavailable { reason: String },

    /// A subprocess could not be started at all.
    #[error("Failed to launch '{program}': {reason}")]
    CommandSpawn { program: String, reason: String },

    /// A command or package the handler depends on is not installed.
    #[error("{kind} prerequisite '{name}' not found")]
    PrerequisiteMissing { kind: &'static str, name: String },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// The import search-path registry lock was poisoned.
    #[error("Import search path is unavailable")]
    SearchPathLockError,
}

fn render_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{trimmed}")
    }
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ModuleNotFound { path } => vec![
                format!("Nothing exists at {}", path.display()),
                "Relative paths are resolved from the project's templates/ directory".into(),
            ],
            Self::ClassNotFound { class_name, .. } => vec![
                format!("Define 'class {}' at the top level of the module", class_name),
                "Or set class_name to the stack class the module defines".into(),
            ],
            Self::SynthesisFailed { .. } => vec![
                "The CDK output above explains why synthesis failed".into(),
                "Run with -vv to see the exact command".into(),
            ],
            Self::PublishFailed { .. } => vec![
                "The synthesized template is valid; only the asset upload failed".into(),
                "Check the credentials and region exported to cdk-assets".into(),
            ],
            Self::PrerequisiteMissing { name, .. } => vec![
                format!("Install '{}' and make sure it is on PATH", name),
                "cdk-assets can be installed with: npm install cdk-assets".into(),
            ],
            Self::CommandSpawn { program, .. } => vec![
                format!("Ensure '{}' is installed and in your PATH", program),
                "Run 'sceptre-cdk check' to verify prerequisites".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get the stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::ModuleNotFound { .. }
            | Self::ModuleUnreadable { .. }
            | Self::ClassNotFound { .. } => Stage::Load,
            Self::SynthesisFailed { .. } | Self::AssemblyInvalid { .. } => Stage::Synthesis,
            Self::PublishFailed { .. }
            | Self::AssetManifestInvalid { .. }
            | Self::SessionUnavailable { .. } => Stage::Publishing,
            Self::PrerequisiteMissing { .. } => Stage::Configuration,
            Self::CommandSpawn { .. }
            | Self::FilesystemError { .. }
            | Self::SearchPathLockError => Stage::Internal,
        }
    }
}
