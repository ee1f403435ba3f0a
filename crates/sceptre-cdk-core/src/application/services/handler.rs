//! CDK Handler - the template handler's single entry point.
//!
//! Wires the workflow together:
//! 1. Validate arguments into a plan
//! 2. Load the stack definition
//! 3. Build the synthesizer and context
//! 4. Synthesize and select the stack's template
//! 5. Publish assets
//!
//! The assembly is removed on every exit path.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    application::{
        ApplicationError, AssetPublisher, ImportPathRegistry, ModuleLoader, PrerequisiteChecker, PublishOutcome,
        SynthesisInvoker, TemplateBody, Toolchain,
        ports::{OutputSink, ProcessRunner, SessionProvider},
    },
    domain::{
        ConnectionInfo, HandlerArguments, HandlerPlan, ParameterValue, PublishingEnvironment,
        StackConfig, SynthesisContext, SynthesizerConfig, normalize_path,
    },
    error::HandlerResult,
};

/// Everything the orchestrator hands over for one stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HandleRequest {
    pub arguments: HandlerArguments,
    /// Sceptre project root; relative stack paths live under its
    /// `templates/` directory.
    pub project_path: PathBuf,
    pub connection: ConnectionInfo,
    pub sceptre_user_data: Value,
    pub parameters: BTreeMap<String, ParameterValue>,
    /// Skip asset publishing when `false`.
    pub publish: bool,
}

impl HandleRequest {
    pub fn new(arguments: HandlerArguments, project_path: impl Into<PathBuf>) -> Self {
        Self {
            arguments,
            project_path: project_path.into(),
            connection: ConnectionInfo::default(),
            sceptre_user_data: Value::Null,
            parameters: BTreeMap::new(),
            publish: true,
        }
    }

    /// Build a request from a parsed stack config file.
    pub fn from_stack_config(
        config: StackConfig,
        project_path: impl Into<PathBuf>,
        fallback_region: Option<&str>,
    ) -> HandlerResult<Self> {
        let connection = config.connection(fallback_region)?;
        Ok(Self {
            arguments: config.template,
            project_path: project_path.into(),
            connection,
            sceptre_user_data: config.sceptre_user_data,
            parameters: config.parameters,
            publish: true,
        })
    }
}

/// The CDK template handler.
pub struct CdkHandler {
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn OutputSink>,
    session: Box<dyn SessionProvider>,
    registry: Arc<ImportPathRegistry>,
    toolchain: Toolchain,
    scratch_root: Option<PathBuf>,
}

impl CdkHandler {
    /// Create a handler with the given adapters and the process-wide
    /// import registry.
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        sink: Arc<dyn OutputSink>,
        session: Box<dyn SessionProvider>,
    ) -> Self {
        Self {
            runner,
            sink,
            session,
            registry: ImportPathRegistry::global(),
            toolchain: Toolchain::default(),
            scratch_root: None,
        }
    }

    pub fn with_registry(mut self, registry: Arc<ImportPathRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_scratch_root(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_root = dir;
        self
    }

    /// Validate arguments and the toolchain without synthesizing.
    #[instrument(skip_all)]
    pub fn validate(&self, request: &HandleRequest) -> HandlerResult<HandlerPlan> {
        let project_path = project_root(&request.project_path)?;
        let plan = request.arguments.clone().into_plan(&project_path)?;
        PrerequisiteChecker::new(Arc::clone(&self.runner), self.toolchain.clone())
            .check(!plan.reference.is_project_descriptor())?;
        Ok(plan)
    }

    /// Synthesize the stack, publish its assets and return the template.
    ///
    /// A publishing failure still carries the synthesized template; see
    /// [`HandlerError::template`](crate::error::HandlerError::template).
    #[instrument(skip_all, fields(project = %request.project_path.display()))]
    pub fn handle(&self, request: &HandleRequest) -> HandlerResult<TemplateBody> {
        let project_path = project_root(&request.project_path)?;
        let plan = request.arguments.clone().into_plan(&project_path)?;
        info!(
            path = %plan.reference.path().display(),
            deployment_type = %plan.strategy.deployment_type(),
            "Handling CDK stack"
        );

        let loaded = ModuleLoader::new(Arc::clone(&self.registry), &project_path)
            .load(&plan.reference)?;

        let mut context = plan.context;
        let synthesizer = SynthesizerConfig::build(&plan.strategy, &mut context);
        let synthesis_context = SynthesisContext::new(
            context,
            request.parameters.clone(),
            request.sceptre_user_data.clone(),
        );

        let session = self.session.session_credentials(&request.connection)?;
        let environment = PublishingEnvironment::derive(&request.connection, session);

        let assembly = SynthesisInvoker::new(Arc::clone(&self.runner), Arc::clone(&self.sink))
            .with_toolchain(self.toolchain.clone())
            .with_scratch_root(self.scratch_root.clone())
            .synthesize(
                &loaded,
                &synthesizer,
                &synthesis_context,
                &environment.overrides(),
            )?;

        let stack = assembly.select(loaded.stack_id())?;
        let template = assembly.template(&stack)?;

        if request.publish {
            let outcome = AssetPublisher::new(Arc::clone(&self.runner), Arc::clone(&self.sink))
                .with_npx(&self.toolchain.npx)
                .publish(&assembly, &stack, &environment)
                .map_err(|e| e.with_template(&template))?;
            if outcome == PublishOutcome::NothingToPublish {
                info!("No assets to publish");
            }
        } else {
            info!("Asset publishing disabled");
        }

        assembly.close()?;
        info!(stack_id = %stack.id, "Template ready");
        Ok(template)
    }
}

/// The project root as an absolute path with `.` and `..` folded.
///
/// Subprocesses run with their own working directory, so every path handed
/// to them must not depend on the caller's.
fn project_root(path: &Path) -> HandlerResult<PathBuf> {
    std::path::absolute(path)
        .map(|absolute| normalize_path(&absolute))
        .map_err(|e| {
            ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DiscardOutput, MockSessionProvider, ProcessOutput};
    use crate::application::services::testing::{FakeRunner, write_assembly};
    use crate::error::Stage;
    use std::fs;
    use std::path::Path;

    fn project_with_stack(root: &Path) {
        let templates = root.join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(
            templates.join("stack.py"),
            "class CdkStack(Stack):\n    pass\n",
        )
        .unwrap();
    }

    fn arguments(path: &str) -> HandlerArguments {
        HandlerArguments {
            path: Some(path.into()),
            deployment_type: Some("bootstrapped".into()),
            bootstrap_qualifier: Some("q1".into()),
            ..Default::default()
        }
    }

    fn no_session() -> Box<MockSessionProvider> {
        let mut session = MockSessionProvider::new();
        session.expect_session_credentials().returning(|_| Ok(None));
        Box::new(session)
    }

    fn synth_ok() -> Arc<FakeRunner> {
        Arc::new(FakeRunner::new(|spec| {
            if spec.program == "python3" {
                let request: Value =
                    serde_json::from_str(&fs::read_to_string(&spec.args[1]).unwrap()).unwrap();
                write_assembly(
                    Path::new(request["outdir"].as_str().unwrap()),
                    &[request["stack_id"].as_str().unwrap()],
                    None,
                );
            }
            ProcessOutput {
                status: Some(0),
                ..Default::default()
            }
        }))
    }

    fn handler(runner: &Arc<FakeRunner>, session: Box<MockSessionProvider>) -> CdkHandler {
        CdkHandler::new(runner.clone(), Arc::new(DiscardOutput), session)
            .with_registry(Arc::new(ImportPathRegistry::default()))
    }

    #[test]
    fn handles_single_module_stack() {
        let root = tempfile::tempdir().unwrap();
        project_with_stack(root.path());
        let runner = synth_ok();

        let template = handler(&runner, no_session())
            .handle(&HandleRequest::new(arguments("stack.py"), root.path()))
            .unwrap();
        assert!(template.as_str().contains("Resources"));

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "python3");
    }

    #[test]
    fn qualifier_reaches_the_shim_context() {
        let root = tempfile::tempdir().unwrap();
        project_with_stack(root.path());
        let captured = Arc::new(std::sync::Mutex::new(Value::Null));
        let sink = Arc::clone(&captured);
        let runner = Arc::new(FakeRunner::new(move |spec| {
            let request: Value =
                serde_json::from_str(&fs::read_to_string(&spec.args[1]).unwrap()).unwrap();
            write_assembly(Path::new(request["outdir"].as_str().unwrap()), &["CDKStack"], None);
            *sink.lock().unwrap() = request;
            ProcessOutput {
                status: Some(0),
                ..Default::default()
            }
        }));

        handler(&runner, no_session())
            .handle(&HandleRequest::new(arguments("stack.py"), root.path()))
            .unwrap();

        let request = captured.lock().unwrap().clone();
        assert_eq!(request["context"]["@aws-cdk/core:bootstrapQualifier"], "q1");
        assert_eq!(request["synthesizer"]["kind"], "default");
        assert_eq!(request["synthesizer"]["qualifier"], "q1");
        assert_eq!(request["class_name"], "CdkStack");
    }

    #[test]
    fn configuration_errors_precede_any_subprocess() {
        let root = tempfile::tempdir().unwrap();
        project_with_stack(root.path());
        let runner = synth_ok();
        let mut args = arguments("stack.py");
        args.deployment_type = Some("bootstrapless".into());

        let err = handler(&runner, no_session())
            .handle(&HandleRequest::new(args, root.path()))
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Configuration);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn missing_class_launches_nothing() {
        let root = tempfile::tempdir().unwrap();
        project_with_stack(root.path());
        let runner = synth_ok();
        let mut args = arguments("stack.py");
        args.class_name = Some("Other".into());

        let err = handler(&runner, no_session())
            .handle(&HandleRequest::new(args, root.path()))
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Load);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn session_errors_are_publishing_errors() {
        let root = tempfile::tempdir().unwrap();
        project_with_stack(root.path());
        let runner = synth_ok();
        let mut session = MockSessionProvider::new();
        session.expect_session_credentials().returning(|_| {
            Err(crate::application::ApplicationError::SessionUnavailable {
                reason: "expired".into(),
            }
            .into())
        });

        let err = handler(&runner, Box::new(session))
            .handle(&HandleRequest::new(arguments("stack.py"), root.path()))
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Publishing);
    }

    #[test]
    fn relative_project_path_reaches_the_shim_as_absolute_paths() {
        let root = tempfile::tempdir_in(".").unwrap();
        project_with_stack(root.path());
        let relative = PathBuf::from(root.path().file_name().unwrap());
        let captured = Arc::new(std::sync::Mutex::new(Value::Null));
        let sink = Arc::clone(&captured);
        let runner = Arc::new(FakeRunner::new(move |spec| {
            let request: Value =
                serde_json::from_str(&fs::read_to_string(&spec.args[1]).unwrap()).unwrap();
            write_assembly(Path::new(request["outdir"].as_str().unwrap()), &["CDKStack"], None);
            *sink.lock().unwrap() = request;
            ProcessOutput {
                status: Some(0),
                ..Default::default()
            }
        }));

        handler(&runner, no_session())
            .handle(&HandleRequest::new(arguments("stack.py"), &relative))
            .unwrap();

        let calls = runner.calls();
        let cwd = calls[0].cwd.clone().unwrap();
        assert!(cwd.is_absolute());

        let module_path = PathBuf::from(captured.lock().unwrap()["module_path"].as_str().unwrap());
        assert!(module_path.is_absolute());
        assert!(module_path.is_file());
        assert_eq!(module_path, cwd.join("templates").join("stack.py"));

        let python_path = calls[0].env.get("PYTHONPATH").unwrap();
        for entry in std::env::split_paths(python_path) {
            assert!(entry.is_absolute(), "{} is relative", entry.display());
        }
    }

    #[test]
    fn validate_requires_python_for_modules() {
        let root = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(|spec| ProcessOutput {
            status: Some(if spec.program == "python3" { 127 } else { 0 }),
            ..Default::default()
        }));
        let handler = handler(&runner, no_session());

        let err = handler
            .validate(&HandleRequest::new(arguments("stack.py"), root.path()))
            .unwrap_err();
        assert!(err.to_string().contains("python3"));

        assert!(
            handler
                .validate(&HandleRequest::new(arguments("app/cdk.json"), root.path()))
                .is_ok()
        );
    }
}
