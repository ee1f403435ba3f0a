//! Fixtures shared by the binary tests.

#![allow(dead_code, deprecated)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

pub const STACK_MODULE: &str = "\
import aws_cdk


class CdkStack(aws_cdk.Stack):
    def __init__(self, scope, id, sceptre_user_data, **kwargs):
        super().__init__(scope, id, **kwargs)
";

/// A Sceptre project directory with one single-module stack, plus an
/// isolated home so no user config leaks in.
pub struct Workspace {
    pub root: tempfile::TempDir,
    pub home: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("s3.py"), STACK_MODULE).unwrap();
        Self {
            root,
            home: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write a stack config and return its path.
    pub fn stack_file(&self, name: &str, body: &str) -> PathBuf {
        let dir = self.path().join("config");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    /// The binary, run from the project root with a scrubbed environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sceptre-cdk").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("AWS_DEFAULT_REGION")
            .env_remove("AWS_ACCESS_KEY_ID")
            .env_remove("AWS_SECRET_ACCESS_KEY")
            .env_remove("AWS_SESSION_TOKEN");
        for (key, _) in std::env::vars() {
            if key.starts_with("SCEPTRE_CDK__") {
                cmd.env_remove(key);
            }
        }
        cmd
    }
}

pub fn stack_yaml(extra: &str) -> String {
    format!(
        "template:\n  type: cdk\n  path: s3.py\n  deployment_type: bootstrapped\n{extra}region: eu-west-1\n"
    )
}
