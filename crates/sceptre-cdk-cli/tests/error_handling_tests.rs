//! Exit codes and error messages of the sceptre-cdk binary.

mod common;

use predicates::prelude::*;

use common::{Workspace, stack_yaml};

#[test]
fn no_arguments_is_a_usage_error() {
    Workspace::new().cmd().assert().code(2);
}

#[test]
fn missing_stack_file_exits_3() {
    Workspace::new()
        .cmd()
        .args(["render", "config/absent.yaml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Stack file not found"));
}

#[test]
fn missing_class_is_a_load_error() {
    let ws = Workspace::new();
    let stack = ws.stack_file("s3.yaml", &stack_yaml("  class_name: BucketStack\n"));

    ws.cmd()
        .args(["render", stack.to_str().unwrap()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("load failed"))
        .stderr(predicate::str::contains("BucketStack"));
}

#[test]
fn missing_module_is_a_load_error() {
    let ws = Workspace::new();
    let stack = ws.stack_file(
        "vpc.yaml",
        "template:\n  path: vpc.py\n  deployment_type: bootstrapped\nregion: eu-west-1\n",
    );

    ws.cmd()
        .args(["render", stack.to_str().unwrap()])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("vpc.py"));
}

#[test]
fn mixed_strategies_exit_4() {
    let ws = Workspace::new();
    let stack = ws.stack_file(
        "s3.yaml",
        &stack_yaml("  bootstrapless_config:\n    file_asset_bucket_name: assets\n"),
    );

    ws.cmd()
        .args(["render", stack.to_str().unwrap()])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("configuration failed"))
        .stderr(predicate::str::contains("bootstrapless_config"));
}

#[test]
fn unknown_template_key_exits_4() {
    let ws = Workspace::new();
    let stack = ws.stack_file("s3.yaml", &stack_yaml("  qualifier: abc\n"));

    ws.cmd()
        .args(["render", stack.to_str().unwrap()])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("qualifier"));
}

#[test]
fn missing_region_exits_4() {
    let ws = Workspace::new();
    let stack = ws.stack_file(
        "s3.yaml",
        "template:\n  path: s3.py\n  deployment_type: bootstrapped\n",
    );

    ws.cmd()
        .args(["render", stack.to_str().unwrap()])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("region"));
}

#[test]
fn half_a_session_is_a_publishing_error() {
    let ws = Workspace::new();
    let stack = ws.stack_file("s3.yaml", &stack_yaml(""));

    ws.cmd()
        .env("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE")
        .args(["render", stack.to_str().unwrap()])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("publishing failed"));
}

#[test]
fn unknown_config_key_exits_4() {
    Workspace::new()
        .cmd()
        .args(["config", "get", "defaults.lang"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn explicit_config_file_must_exist() {
    Workspace::new()
        .cmd()
        .args(["-c", "missing.toml", "schema"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn verbose_errors_drop_the_hint() {
    Workspace::new()
        .cmd()
        .args(["-v", "render", "config/absent.yaml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("--verbose for more details").not());
}
