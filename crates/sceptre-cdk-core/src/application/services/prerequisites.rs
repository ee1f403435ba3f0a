//! Prerequisite checks for the external toolchain.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError, Toolchain,
        ports::{CommandSpec, DiscardOutput, ProcessRunner},
    },
    error::HandlerResult,
};

/// Node package that publishes assets.
pub const CDK_ASSETS_PACKAGE: &str = "cdk-assets";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrerequisiteKind {
    Command,
    NodePackage,
}

impl PrerequisiteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::NodePackage => "node package",
        }
    }
}

impl fmt::Display for PrerequisiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteStatus {
    pub name: String,
    pub kind: PrerequisiteKind,
    pub found: bool,
}

pub struct PrerequisiteChecker {
    runner: Arc<dyn ProcessRunner>,
    toolchain: Toolchain,
}

impl PrerequisiteChecker {
    pub fn new(runner: Arc<dyn ProcessRunner>, toolchain: Toolchain) -> Self {
        Self { runner, toolchain }
    }

    /// Check everything, without failing on the first miss.
    #[instrument(skip(self))]
    pub fn report(&self, require_python: bool) -> Vec<PrerequisiteStatus> {
        let mut commands = vec![self.toolchain.node.clone(), self.toolchain.npx.clone()];
        if require_python {
            commands.push(self.toolchain.python.clone());
        }

        let mut statuses: Vec<PrerequisiteStatus> = commands
            .into_iter()
            .map(|name| {
                let found = self.command_exists(&name);
                PrerequisiteStatus {
                    name,
                    kind: PrerequisiteKind::Command,
                    found,
                }
            })
            .collect();
        statuses.push(PrerequisiteStatus {
            name: CDK_ASSETS_PACKAGE.to_string(),
            kind: PrerequisiteKind::NodePackage,
            found: self.node_package_exists(CDK_ASSETS_PACKAGE),
        });
        statuses
    }

    /// Fail with the first missing prerequisite.
    pub fn check(&self, require_python: bool) -> HandlerResult<()> {
        match self.report(require_python).into_iter().find(|s| !s.found) {
            Some(missing) => Err(ApplicationError::PrerequisiteMissing {
                kind: missing.kind.as_str(),
                name: missing.name,
            }
            .into()),
            None => Ok(()),
        }
    }

    fn command_exists(&self, program: &str) -> bool {
        let exists = self.succeeds(CommandSpec::new(program).arg("--version"));
        debug!(command = program, exists, "Checked command");
        exists
    }

    /// Workspace install first, then global.
    fn node_package_exists(&self, package: &str) -> bool {
        let workspace = self.succeeds(CommandSpec::new(&self.toolchain.npm).args(["list", package]));
        debug!(package, exists = workspace, "Checked workspace node package");
        if workspace {
            return true;
        }
        let global = self.succeeds(
            CommandSpec::new(&self.toolchain.npm).args(["--global", "list", package]),
        );
        debug!(package, exists = global, "Checked global node package");
        global
    }

    fn succeeds(&self, command: CommandSpec) -> bool {
        self.runner
            .run(&command, &DiscardOutput)
            .is_ok_and(|output| output.success())
    }
}
