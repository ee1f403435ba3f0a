//! Scripted process runner for testing.

use std::sync::{Mutex, PoisonError};

use sceptre_cdk_core::{
    application::{
        ApplicationError,
        ports::{CommandSpec, OutputSink, ProcessOutput, ProcessRunner, StreamKind},
    },
    error::HandlerResult,
};

type Matcher = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;
type Responder = Box<dyn Fn(&CommandSpec) -> ProcessOutput + Send + Sync>;

struct Rule {
    matches: Matcher,
    respond: Responder,
}

/// Runner that answers commands from a script instead of launching them.
///
/// Rules are tried in the order they were added; the first match answers.
/// Unmatched commands exit 0 with no output. Every command is recorded,
/// including ones that fail to "launch".
pub struct ScriptedProcessRunner {
    rules: Vec<Rule>,
    missing: Vec<String>,
    invocations: Mutex<Vec<CommandSpec>>,
}

impl ScriptedProcessRunner {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            missing: Vec::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Answer commands accepted by `matches`. The responder may write files,
    /// for example a cloud assembly into the requested output directory.
    pub fn on(
        mut self,
        matches: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static,
        respond: impl Fn(&CommandSpec) -> ProcessOutput + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule {
            matches: Box::new(matches),
            respond: Box::new(respond),
        });
        self
    }

    /// Answer every command running `program`.
    pub fn on_program(
        self,
        program: &str,
        respond: impl Fn(&CommandSpec) -> ProcessOutput + Send + Sync + 'static,
    ) -> Self {
        let program = program.to_string();
        self.on(move |spec| spec.program == program, respond)
    }

    /// Treat `program` as not installed.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Commands seen so far, in order.
    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ScriptedProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for ScriptedProcessRunner {
    fn run(&self, command: &CommandSpec, sink: &dyn OutputSink) -> HandlerResult<ProcessOutput> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());

        if self.missing.contains(&command.program) {
            return Err(ApplicationError::CommandSpawn {
                program: command.program.clone(),
                reason: "No such file or directory".into(),
            }
            .into());
        }

        let output = self
            .rules
            .iter()
            .find(|rule| (rule.matches)(command))
            .map(|rule| (rule.respond)(command))
            .unwrap_or_else(|| exit_with(0, "", ""));

        for line in output.stdout.lines() {
            sink.line(StreamKind::Stdout, line);
        }
        for line in output.stderr.lines() {
            sink.line(StreamKind::Stderr, line);
        }
        Ok(output)
    }
}

/// A finished process with the given exit code and output.
pub fn exit_with(code: i32, stdout: &str, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        status: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    }
}
