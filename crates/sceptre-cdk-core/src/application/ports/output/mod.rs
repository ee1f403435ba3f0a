//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `sceptre-cdk-adapters` crate provides implementations.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::{ConnectionInfo, EnvironmentOverrides, SessionCredentials};
use crate::error::HandlerResult;

/// Which pipe a line of subprocess output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// Port for live subprocess output.
///
/// Implemented by:
/// - `sceptre_cdk_adapters::output::TracingOutputSink` (production)
/// - `DiscardOutput` (checks whose output only matters on failure)
pub trait OutputSink: Send + Sync {
    /// Receive one line, without its trailing newline.
    fn line(&self, stream: StreamKind, line: &str);
}

/// Sink that drops every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardOutput;

impl OutputSink for DiscardOutput {
    fn line(&self, _stream: StreamKind, _line: &str) {}
}

/// A subprocess to launch. No shell is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Applied on top of the inherited environment.
    pub env: EnvironmentOverrides,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, env: EnvironmentOverrides) -> Self {
        self.env.merge(&env);
        self
    }

    /// Program and arguments joined for log and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn status_display(&self) -> String {
        match self.status {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        }
    }

    /// Captured stderr followed by stdout, for error reports.
    pub fn combined(&self) -> String {
        let mut combined = self.stderr.trim_end().to_string();
        let stdout = self.stdout.trim_end();
        if !stdout.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(stdout);
        }
        combined
    }
}

/// Port for running subprocesses.
///
/// Implemented by:
/// - `sceptre_cdk_adapters::process::SystemProcessRunner` (production)
/// - `sceptre_cdk_adapters::process::ScriptedProcessRunner` (testing)
///
/// A non-zero exit is not an error at this level: the runner reports it in
/// [`ProcessOutput::status`] and the calling service decides which stage
/// failed. `Err` means the process could not be run at all.
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, streaming every output line to `sink` while
    /// also capturing it.
    fn run(&self, command: &CommandSpec, sink: &dyn OutputSink) -> HandlerResult<ProcessOutput>;
}

/// Port for the orchestrator's already-resolved AWS session.
///
/// Implemented by:
/// - `sceptre_cdk_adapters::session::EnvSessionProvider` (exported variables)
#[cfg_attr(test, mockall::automock)]
pub trait SessionProvider: Send + Sync {
    /// Credentials of the session used for this stack, if any.
    fn session_credentials(
        &self,
        connection: &ConnectionInfo,
    ) -> HandlerResult<Option<SessionCredentials>>;
}
