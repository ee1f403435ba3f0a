//! Integration tests for sceptre-cdk-core.
//!
//! These exercise the public API only: arguments in, plans and search
//! paths out. Process-driven workflows are covered in
//! `sceptre-cdk-adapters/tests` with the scripted runner.

use std::fs;
use std::path::{Path, PathBuf};

use sceptre_cdk_core::{
    application::ImportPathRegistry,
    domain::{
        DeploymentStrategy, DomainError, ImportSearchPath, StackSource, SynthesizerConfig,
        QUALIFIER_CONTEXT_KEY,
    },
    prelude::*,
};
use serde_json::json;

const CONFIG: &str = r#"
template:
  type: cdk
  path: networking/vpc.py
  deployment_type: bootstrapped
  bootstrap_qualifier: abc123
  class_name: VpcStack
  context:
    "@aws-cdk/aws-s3:createDefaultLoggingPolicy": true
region: eu-west-1
"#;

#[test]
fn stack_config_becomes_a_plan() {
    let config = StackConfig::from_yaml(CONFIG).unwrap();
    let plan = config.template.into_plan(Path::new("/srv/project")).unwrap();

    assert_eq!(
        plan.reference.path(),
        Path::new("/srv/project/templates/networking/vpc.py")
    );
    assert_eq!(
        plan.reference.source(),
        &StackSource::SingleModule {
            class_name: "VpcStack".into()
        }
    );
    assert_eq!(
        plan.strategy,
        DeploymentStrategy::Bootstrapped {
            qualifier: Some("abc123".into())
        }
    );
}

#[test]
fn qualifier_is_written_into_context() {
    let plan = StackConfig::from_yaml(CONFIG)
        .unwrap()
        .template
        .into_plan(Path::new("/srv/project"))
        .unwrap();
    let mut context = plan.context;
    let synthesizer = SynthesizerConfig::build(&plan.strategy, &mut context);

    assert_eq!(context[QUALIFIER_CONTEXT_KEY], json!("abc123"));
    assert_eq!(
        context["@aws-cdk/aws-s3:createDefaultLoggingPolicy"],
        json!(true)
    );
    assert_eq!(
        synthesizer,
        SynthesizerConfig::Default {
            qualifier: Some("abc123".into())
        }
    );
}

#[test]
fn mixed_strategies_are_rejected_before_loading() {
    let raw = r#"
template:
  path: missing.py
  deployment_type: bootstrapped
  bootstrapless_config:
    file_asset_bucket_name: assets
"#;
    let err = StackConfig::from_yaml(raw)
        .unwrap()
        .template
        .into_plan(Path::new("/nowhere"))
        .unwrap_err();
    assert!(matches!(err, DomainError::ConflictingStrategy { .. }));
}

#[test]
fn unknown_bootstrapless_key_is_named() {
    let raw = r#"
template:
  path: s.py
  deployment_type: bootstrapless
  bootstrapless_config:
    file_asset_bucket: assets
"#;
    let err: HandlerError = StackConfig::from_yaml(raw)
        .unwrap()
        .template
        .into_plan(Path::new("/p"))
        .unwrap_err()
        .into();
    assert_eq!(err.stage(), Stage::Configuration);
    assert!(err.to_string().contains("file_asset_bucket"));
}

#[test]
fn search_path_skips_packages_and_stays_inside_working_dir() {
    let work = tempfile::tempdir().unwrap();
    let root = work.path();
    let module_dir = root.join("templates").join("shared").join("stacks");
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(root.join("templates/shared/__init__.py"), "").unwrap();
    let module = module_dir.join("s3.py");
    fs::write(&module, "class CdkStack:\n    pass\n").unwrap();

    let search = ImportSearchPath::resolve(&module, root);
    assert_eq!(
        search.entries(),
        &[module_dir.clone(), root.join("templates")]
    );
    assert!(search.entries().iter().all(|p| p.starts_with(root)));
    assert!(!search.entries().contains(&root.to_path_buf()));
}

#[test]
fn module_in_working_dir_yields_only_that_dir() {
    let work = tempfile::tempdir().unwrap();
    let search = ImportSearchPath::resolve(&work.path().join("app.py"), work.path());
    assert_eq!(search.entries(), &[work.path().to_path_buf()]);
}

#[test]
fn module_outside_working_dir_yields_nothing() {
    let search = ImportSearchPath::resolve(Path::new("/elsewhere/app.py"), Path::new("/work"));
    assert!(search.is_empty());
}

#[test]
fn registry_is_restored_after_scope() {
    let registry = ImportPathRegistry::new(vec![PathBuf::from("/opt/site")]);
    let search = ImportSearchPath::resolve_with(
        Path::new("/work/a/b/stack.py"),
        Path::new("/work"),
        |_| false,
    );
    {
        let scope = registry.enter(&search).unwrap();
        assert_eq!(scope.effective().unwrap().len(), 3);
    }
    assert_eq!(
        registry.snapshot().unwrap(),
        vec![PathBuf::from("/opt/site")]
    );
}

#[test]
fn schema_lists_every_argument() {
    let schema = sceptre_cdk_core::domain::handler_schema();
    let properties = schema["properties"].as_object().unwrap();
    for key in [
        "type",
        "path",
        "deployment_type",
        "bootstrap_qualifier",
        "bootstrapless_config",
        "class_name",
        "stack_logical_id",
        "context",
    ] {
        assert!(properties.contains_key(key), "missing {key}");
    }
}
