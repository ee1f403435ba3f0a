//! Module Loader - turns a stack reference into something synthesis can run.
//!
//! Nothing is executed here. A single-file module is checked statically
//! for the requested class before any interpreter is started, and a
//! `cdk.json` project is only located.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    application::{ApplicationError, ImportPathRegistry},
    domain::{ImportSearchPath, StackDefinitionReference, StackSource},
    error::HandlerResult,
};

/// Prefix of the unique module names the entry shim loads stacks under.
pub const MODULE_NAME_PREFIX: &str = "sceptre_cdk_stack";

/// A located stack definition, ready to synthesize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedStack {
    /// A single Python file defining a stack class.
    Module {
        path: PathBuf,
        class_name: String,
        /// Name the file is loaded under; unique per load.
        module_name: String,
        stack_id: String,
        working_dir: PathBuf,
        /// Search list in effect while the module was loaded.
        python_path: Vec<PathBuf>,
    },
    /// A CDK project described by `cdk.json`.
    Project {
        descriptor: PathBuf,
        project_dir: PathBuf,
        stack_id: Option<String>,
    },
}

impl LoadedStack {
    /// Stack to select from the synthesized assembly.
    pub fn stack_id(&self) -> Option<&str> {
        match self {
            Self::Module { stack_id, .. } => Some(stack_id),
            Self::Project { stack_id, .. } => stack_id.as_deref(),
        }
    }
}

/// Loads stack definitions.
pub struct ModuleLoader {
    registry: Arc<ImportPathRegistry>,
    working_dir: PathBuf,
}

impl ModuleLoader {
    /// `working_dir` bounds the import roots of single-file modules.
    pub fn new(registry: Arc<ImportPathRegistry>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            working_dir: working_dir.into(),
        }
    }

    #[instrument(skip_all, fields(path = %reference.path().display(), source = %reference.source()))]
    pub fn load(&self, reference: &StackDefinitionReference) -> HandlerResult<LoadedStack> {
        match reference.source() {
            StackSource::ProjectDescriptor => self.load_project(reference),
            StackSource::SingleModule { class_name } => self.load_module(reference, class_name),
        }
    }

    fn load_project(&self, reference: &StackDefinitionReference) -> HandlerResult<LoadedStack> {
        let descriptor = reference.path();
        if !descriptor.is_file() {
            return Err(ApplicationError::ModuleNotFound {
                path: descriptor.to_path_buf(),
            }
            .into());
        }
        let project_dir = descriptor
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.working_dir.clone());

        info!(project_dir = %project_dir.display(), "Located CDK project");
        Ok(LoadedStack::Project {
            descriptor: descriptor.to_path_buf(),
            project_dir,
            stack_id: reference.selection_id().map(str::to_string),
        })
    }

    fn load_module(
        &self,
        reference: &StackDefinitionReference,
        class_name: &str,
    ) -> HandlerResult<LoadedStack> {
        let path = reference.path();
        let source = read_module(path)?;
        if !defines_class(&source, class_name) {
            return Err(ApplicationError::ClassNotFound {
                class_name: class_name.to_string(),
                path: path.to_path_buf(),
            }
            .into());
        }

        let search = ImportSearchPath::resolve(path, &self.working_dir);
        let python_path = {
            let scope = self.registry.enter(&search)?;
            scope.effective()?
        };
        debug!(entries = python_path.len(), "Captured module search list");

        let stack_id = reference
            .selection_id()
            .map(str::to_string)
            .unwrap_or_default();
        info!(class = class_name, stack_id = %stack_id, "Loaded stack module");

        Ok(LoadedStack::Module {
            path: path.to_path_buf(),
            class_name: class_name.to_string(),
            module_name: unique_module_name(path),
            stack_id,
            working_dir: self.working_dir.clone(),
            python_path,
        })
    }
}

fn read_module(path: &Path) -> HandlerResult<String> {
    if path.is_dir() {
        return Err(ApplicationError::ModuleUnreadable {
            path: path.to_path_buf(),
            reason: "is a directory".into(),
        }
        .into());
    }
    std::fs::read_to_string(path).map_err(|e| {
        let err = match e.kind() {
            ErrorKind::NotFound => ApplicationError::ModuleNotFound {
                path: path.to_path_buf(),
            },
            _ => ApplicationError::ModuleUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        };
        err.into()
    })
}

/// Whether `source` declares `class_name` at module top level.
pub fn defines_class(source: &str, class_name: &str) -> bool {
    let pattern = format!(r"(?m)^class\s+{}\s*[(:]", regex::escape(class_name));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(source))
}

fn unique_module_name(path: &Path) -> String {
    let stem: String = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{MODULE_NAME_PREFIX}_{stem}_{}", Uuid::new_v4().simple())
}
