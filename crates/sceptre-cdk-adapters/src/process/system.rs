//! Subprocess adapter using std::process.

use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread;

use sceptre_cdk_core::{
    application::{
        ApplicationError,
        ports::{CommandSpec, OutputSink, ProcessOutput, ProcessRunner, StreamKind},
    },
    error::{HandlerError, HandlerResult},
};
use tracing::{debug, warn};

/// Production runner. Programs are looked up on `PATH`; no shell is
/// involved.
#[derive(Debug, Clone, Copy)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    /// Create a new system process runner.
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec, sink: &dyn OutputSink) -> HandlerResult<ProcessOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }
        for key in &command.env.remove {
            cmd.env_remove(key);
        }
        cmd.envs(&command.env.set);

        debug!(command = %command.display(), cwd = ?command.cwd, "Spawning");
        let mut child = cmd.spawn().map_err(|e| ApplicationError::CommandSpawn {
            program: command.program.clone(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes are drained concurrently so neither can fill up and
        // block the child.
        let (stdout, stderr) = thread::scope(|scope| {
            let out = scope.spawn(|| pump(stdout, StreamKind::Stdout, sink));
            let err = scope.spawn(|| pump(stderr, StreamKind::Stderr, sink));
            (out.join(), err.join())
        });
        let (stdout, stderr) = match (stdout, stderr) {
            (Ok(out), Ok(err)) => (out, err),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(HandlerError::Internal {
                    message: format!("output reader for '{}' panicked", command.program),
                });
            }
        };

        let status = child.wait().map_err(|e| ApplicationError::CommandSpawn {
            program: command.program.clone(),
            reason: e.to_string(),
        })?;
        debug!(command = %command.program, status = ?status.code(), "Process exited");

        Ok(ProcessOutput {
            status: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Forward every line to `sink` and return everything read. Invalid UTF-8
/// is replaced rather than treated as an error.
///
/// A read error ends capture but the pipe is still read to EOF.
fn pump<R: Read>(reader: Option<R>, stream: StreamKind, sink: &dyn OutputSink) -> String {
    let Some(reader) = reader else {
        return String::new();
    };
    let mut reader = BufReader::new(reader);
    let mut captured = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(%stream, error = %e, "Subprocess output unreadable; discarding the rest");
                // Keep the pipe drained so the child cannot block on it.
                let _ = io::copy(&mut reader, &mut io::sink());
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink.line(stream, line.trim_end_matches(['\n', '\r']));
                captured.push_str(&line);
            }
        }
    }
    captured
}
