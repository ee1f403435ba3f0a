//! Import-path resolution for single-file stack definitions.
//!
//! A stack module may import its siblings (`import helpers`) or modules of
//! an enclosing package tree. Python finds those only if the right roots
//! are on its search path: every directory between the module and the
//! working directory that is *not* itself a package. A directory carrying
//! `__init__.py` is reached through its nearest non-package ancestor
//! instead, so adding it would shadow the package layout.
//!
//! The working directory itself is never added unless the module lives
//! directly in it, and nothing outside the working directory is ever added.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

/// File whose presence makes a directory an importable package.
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Ordered search roots, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSearchPath {
    entries: Vec<PathBuf>,
}

impl ImportSearchPath {
    /// Resolve against the real filesystem.
    ///
    /// Both paths should be absolute; `.` and `..` components are folded
    /// before any containment check.
    pub fn resolve(module: &Path, working_dir: &Path) -> Self {
        Self::resolve_with(module, working_dir, |dir| dir.join(PACKAGE_MARKER).is_file())
    }

    /// Resolve with an injected package probe.
    pub fn resolve_with<F>(module: &Path, working_dir: &Path, is_package: F) -> Self
    where
        F: Fn(&Path) -> bool,
    {
        let module = normalize_path(module);
        let working_dir = normalize_path(working_dir);
        let working_dir = working_dir.as_path();
        let Some(module_dir) = module.parent() else {
            return Self::default();
        };

        if !module_dir.starts_with(working_dir) {
            warn!(
                module = %module.display(),
                working_dir = %working_dir.display(),
                "Stack module is outside the working directory; no import roots added"
            );
            return Self::default();
        }

        if module_dir == working_dir {
            return Self {
                entries: vec![module_dir.to_path_buf()],
            };
        }

        let entries = module_dir
            .ancestors()
            .take_while(|dir| *dir != working_dir)
            .filter(|dir| !is_package(*dir))
            .map(Path::to_path_buf)
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root; leading `..` of a relative path
/// are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}
