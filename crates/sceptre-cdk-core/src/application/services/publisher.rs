//! Asset Publisher - uploads a stack's file and image assets with
//! `cdk-assets`.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError, CloudAssembly,
        ports::{CommandSpec, OutputSink, ProcessRunner},
    },
    domain::{PublishingEnvironment, SelectedStack},
    error::HandlerResult,
};

/// What a publishing run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// No asset beyond the template itself; `cdk-assets` was not launched.
    NothingToPublish,
}

pub struct AssetPublisher {
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn OutputSink>,
    npx: String,
}

impl AssetPublisher {
    pub fn new(runner: Arc<dyn ProcessRunner>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            runner,
            sink,
            npx: "npx".into(),
        }
    }

    pub fn with_npx(mut self, npx: impl Into<String>) -> Self {
        self.npx = npx.into();
        self
    }

    #[instrument(skip_all, fields(stack_id = %stack.id))]
    pub fn publish(
        &self,
        assembly: &CloudAssembly,
        stack: &SelectedStack,
        environment: &PublishingEnvironment,
    ) -> HandlerResult<PublishOutcome> {
        let Some((manifest_path, manifest)) = assembly.asset_manifest(stack)? else {
            debug!("Stack has no asset manifest; skipping publish");
            return Ok(PublishOutcome::NothingToPublish);
        };
        if manifest.is_empty() || !manifest.requires_publishing(&stack.template_file) {
            debug!("Only asset is the template; skipping publish");
            return Ok(PublishOutcome::NothingToPublish);
        }

        let command = CommandSpec::new(&self.npx)
            .args(["cdk-assets", "-v", "publish", "--path"])
            .path_arg(&manifest_path)
            .cwd(assembly.dir())
            .env(environment.overrides());

        info!(
            files = manifest.files.len(),
            images = manifest.docker_images.len(),
            "Publishing CDK assets"
        );
        debug!(manifest = %manifest_path.display(), "Asset manifest");

        let output = self
            .runner
            .run(&command, self.sink.as_ref())
            .map_err(|e| ApplicationError::PublishFailed {
                command: command.display(),
                status: "not started".into(),
                output: e.to_string(),
            })?;
        if !output.success() {
            return Err(ApplicationError::PublishFailed {
                command: command.display(),
                status: output.status_display(),
                output: output.combined(),
            }
            .into());
        }

        info!("CDK assets published");
        Ok(PublishOutcome::Published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DiscardOutput, ProcessOutput};
    use crate::application::services::testing::{FakeRunner, open_assembly};
    use crate::domain::{ConnectionInfo, SessionCredentials};
    use crate::error::Stage;
    use serde_json::json;

    fn environment(profile: Option<&str>, session: bool) -> PublishingEnvironment {
        let connection = ConnectionInfo {
            region: "us-east-1".into(),
            account_id: Some("111111111111".into()),
            profile: profile.map(str::to_string),
            iam_role: None,
        };
        let credentials = session.then(|| SessionCredentials {
            access_key_id: "AKIA".into(),
            secret_access_key: "s".into(),
            session_token: Some("t".into()),
        });
        PublishingEnvironment::derive(&connection, credentials)
    }

    fn lambda_assets() -> serde_json::Value {
        json!({
            "version": "21.0.0",
            "files": {
                "abc123": {
                    "source": {"path": "asset.abc123", "packaging": "zip"},
                    "destinations": {"current": {"bucketName": "b", "objectKey": "abc123.zip"}}
                }
            },
            "dockerImages": {}
        })
    }

    fn succeed() -> Arc<FakeRunner> {
        Arc::new(FakeRunner::new(|_| ProcessOutput {
            status: Some(0),
            ..Default::default()
        }))
    }

    #[test]
    fn empty_manifest_publishes_nothing() {
        let (assembly, stack) = open_assembly(Some(json!({"files": {}, "dockerImages": {}})));
        let runner = succeed();
        let outcome = AssetPublisher::new(runner.clone(), Arc::new(DiscardOutput))
            .publish(&assembly, &stack, &environment(None, true))
            .unwrap();
        assert_eq!(outcome, PublishOutcome::NothingToPublish);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn template_only_manifest_publishes_nothing() {
        let assets = json!({
            "files": {
                "h": {"source": {"path": "CDKStack.template.json", "packaging": "file"}}
            }
        });
        let (assembly, stack) = open_assembly(Some(assets));
        let runner = succeed();
        let outcome = AssetPublisher::new(runner.clone(), Arc::new(DiscardOutput))
            .publish(&assembly, &stack, &environment(None, false))
            .unwrap();
        assert_eq!(outcome, PublishOutcome::NothingToPublish);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn one_file_asset_runs_cdk_assets() {
        let (assembly, stack) = open_assembly(Some(lambda_assets()));
        let runner = succeed();
        let outcome = AssetPublisher::new(runner.clone(), Arc::new(DiscardOutput))
            .publish(&assembly, &stack, &environment(Some("dev"), true))
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Published);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.program, "npx");
        assert_eq!(&call.args[..4], ["cdk-assets", "-v", "publish", "--path"]);
        assert_eq!(
            call.args[4],
            assembly.dir().join("CDKStack.assets.json").to_string_lossy()
        );
        assert_eq!(call.cwd.as_deref(), Some(assembly.dir()));
        assert_eq!(call.env.get("AWS_REGION"), Some("us-east-1"));
        assert_eq!(call.env.get("CDK_DEFAULT_ACCOUNT"), Some("111111111111"));
        assert_eq!(call.env.get("AWS_ACCESS_KEY_ID"), Some("AKIA"));
        assert!(call.env.get("AWS_PROFILE").is_none());
    }

    #[test]
    fn nonzero_exit_is_a_publishing_error() {
        let (assembly, stack) = open_assembly(Some(lambda_assets()));
        let runner = Arc::new(FakeRunner::new(|_| ProcessOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: "fail: Access Denied".into(),
        }));
        let err = AssetPublisher::new(runner, Arc::new(DiscardOutput))
            .publish(&assembly, &stack, &environment(None, true))
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Publishing);
        assert!(err.to_string().contains("Access Denied"));
    }
}
