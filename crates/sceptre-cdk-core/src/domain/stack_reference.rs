//! Where a stack definition lives and how it is loaded.

use std::fmt;
use std::path::{Path, PathBuf};

use super::import_path::normalize_path;

/// Class looked up in a single-file module when `class_name` is not set.
pub const DEFAULT_CLASS_NAME: &str = "CdkStack";

/// Construct id given to a single-file stack when `stack_logical_id` is not set.
pub const DEFAULT_STACK_LOGICAL_ID: &str = "CDKStack";

/// File name of a multi-language CDK project descriptor.
pub const PROJECT_DESCRIPTOR: &str = "cdk.json";

/// Directory, relative to the Sceptre project, that relative paths resolve against.
pub const TEMPLATES_DIR: &str = "templates";

/// How the stack definition at a path is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackSource {
    /// A Python source file exposing a stack class.
    SingleModule { class_name: String },
    /// A `cdk.json` project synthesized through the CDK CLI.
    ProjectDescriptor,
}

impl fmt::Display for StackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleModule { class_name } => write!(f, "module class {class_name}"),
            Self::ProjectDescriptor => f.write_str("cdk project"),
        }
    }
}

/// Identifies one stack definition. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDefinitionReference {
    path: PathBuf,
    source: StackSource,
    stack_logical_id: Option<String>,
}

impl StackDefinitionReference {
    /// Resolve a `path` handler argument against the Sceptre project.
    ///
    /// Relative paths are taken from `<project_path>/templates`; absolute
    /// paths are used as given. A file named `cdk.json` selects the project
    /// descriptor source and `class_name` is then ignored.
    pub fn resolve(
        project_path: &Path,
        raw_path: &str,
        class_name: Option<&str>,
        stack_logical_id: Option<&str>,
    ) -> Self {
        let normalised = raw_path.replace('\\', "/");
        let raw = Path::new(&normalised);
        let path = if raw.is_absolute() {
            normalize_path(raw)
        } else {
            normalize_path(&project_path.join(TEMPLATES_DIR).join(raw))
        };

        let source = if path.file_name().is_some_and(|n| n == PROJECT_DESCRIPTOR) {
            StackSource::ProjectDescriptor
        } else {
            StackSource::SingleModule {
                class_name: class_name.unwrap_or(DEFAULT_CLASS_NAME).to_string(),
            }
        };

        Self {
            path,
            source,
            stack_logical_id: stack_logical_id.map(str::to_string),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &StackSource {
        &self.source
    }

    pub fn is_project_descriptor(&self) -> bool {
        matches!(self.source, StackSource::ProjectDescriptor)
    }

    /// The stack id asked for by the handler arguments, if any.
    pub fn requested_stack_id(&self) -> Option<&str> {
        self.stack_logical_id.as_deref()
    }

    /// The stack id to select from the assembly after synthesis.
    ///
    /// Single-file stacks are always constructed under a known id, so that id
    /// is selected. Project stacks only narrow when the id was supplied.
    pub fn selection_id(&self) -> Option<&str> {
        match self.source {
            StackSource::SingleModule { .. } => {
                Some(self.requested_stack_id().unwrap_or(DEFAULT_STACK_LOGICAL_ID))
            }
            StackSource::ProjectDescriptor => self.requested_stack_id(),
        }
    }
}
