//! Synthesis Invoker - runs CDK and collects the cloud assembly.
//!
//! Single-file stacks run through the embedded entry shim under the
//! configured Python interpreter. `cdk.json` projects run `cdk synth`
//! in their own directory.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tempfile::TempDir;
use tracing::{debug, info, instrument};

use crate::{
    application::{
        ApplicationError, LoadedStack,
        ports::{CommandSpec, OutputSink, ProcessOutput, ProcessRunner},
    },
    domain::{
        ASSEMBLY_MANIFEST, AssemblyManifest, AssetManifest, EnvironmentOverrides, ParameterValue,
        SelectedStack, SynthesisContext, SynthesizerConfig, normalize_path,
    },
    error::{HandlerError, HandlerResult},
};

/// The Python program that loads and synthesizes a single-file stack.
pub const ENTRY_SHIM: &str = include_str!("shim/entry.py");

pub const SHIM_FILE: &str = "sceptre_cdk_entry.py";
pub const REQUEST_FILE: &str = "sceptre_cdk_request.json";
pub const USER_DATA_FILE: &str = "sceptre_user_data.json";
/// Points `cdk.json` apps at the serialized `sceptre_user_data`.
pub const USER_DATA_ENV: &str = "SCEPTRE_CDK_USER_DATA_FILE";
pub const ASSEMBLY_DIR: &str = "cdk.out";

/// External programs the handler launches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub npx: String,
    pub npm: String,
    pub node: String,
    pub python: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            npx: "npx".into(),
            npm: "npm".into(),
            node: "node".into(),
            python: "python3".into(),
        }
    }
}

/// A rendered CloudFormation template, as YAML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateBody(String);

impl TemplateBody {
    /// Render a template document. Keys come out sorted, so equal
    /// documents always render to identical bytes.
    pub fn from_json(template: &Value) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::to_string(template).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synthesis output. The temporary directory is removed when this value
/// is dropped or [`closed`](Self::close).
#[derive(Debug)]
pub struct CloudAssembly {
    scratch: TempDir,
    outdir: PathBuf,
    manifest: AssemblyManifest,
}

impl CloudAssembly {
    /// Read `manifest.json` from `outdir`, taking ownership of `scratch`.
    pub fn open(scratch: TempDir, outdir: PathBuf) -> HandlerResult<Self> {
        let manifest_path = outdir.join(ASSEMBLY_MANIFEST);
        let manifest: AssemblyManifest = read_json(&manifest_path).map_err(|reason| {
            ApplicationError::AssemblyInvalid {
                path: manifest_path.clone(),
                reason,
            }
        })?;
        debug!(artifacts = manifest.artifacts.len(), "Read assembly manifest");
        Ok(Self {
            scratch,
            outdir,
            manifest,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.outdir
    }

    pub fn manifest(&self) -> &AssemblyManifest {
        &self.manifest
    }

    pub fn select(&self, requested: Option<&str>) -> HandlerResult<SelectedStack> {
        Ok(self.manifest.select_stack(requested)?)
    }

    pub fn template(&self, stack: &SelectedStack) -> HandlerResult<TemplateBody> {
        let path = self.outdir.join(&stack.template_file);
        let template: Value = read_json(&path).map_err(|reason| ApplicationError::AssemblyInvalid {
            path: path.clone(),
            reason,
        })?;
        TemplateBody::from_json(&template).map_err(|e| {
            ApplicationError::AssemblyInvalid {
                path,
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// The stack's asset manifest and its absolute path, if it has one.
    pub fn asset_manifest(
        &self,
        stack: &SelectedStack,
    ) -> HandlerResult<Option<(PathBuf, AssetManifest)>> {
        let Some(file) = stack.asset_manifest.as_deref() else {
            return Ok(None);
        };
        let path = self.outdir.join(file);
        let manifest = read_json(&path).map_err(|reason| ApplicationError::AssetManifestInvalid {
            path: path.clone(),
            reason,
        })?;
        Ok(Some((path, manifest)))
    }

    /// Remove the temporary directory now, reporting failures.
    pub fn close(self) -> HandlerResult<()> {
        let path = self.scratch.path().to_path_buf();
        self.scratch.close().map_err(|e| {
            ApplicationError::FilesystemError {
                path,
                reason: e.to_string(),
            }
            .into()
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}

/// Request handed to the entry shim.
#[derive(Serialize)]
struct ShimRequest<'a> {
    module_path: &'a Path,
    module_name: &'a str,
    class_name: &'a str,
    stack_id: &'a str,
    outdir: &'a Path,
    context: &'a Map<String, Value>,
    user_data: &'a Value,
    parameters: &'a BTreeMap<String, ParameterValue>,
    synthesizer: &'a SynthesizerConfig,
}

/// Runs synthesis for loaded stacks.
pub struct SynthesisInvoker {
    runner: Arc<dyn ProcessRunner>,
    sink: Arc<dyn OutputSink>,
    toolchain: Toolchain,
    scratch_root: Option<PathBuf>,
}

impl SynthesisInvoker {
    pub fn new(runner: Arc<dyn ProcessRunner>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            runner,
            sink,
            toolchain: Toolchain::default(),
            scratch_root: None,
        }
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Create temporary assemblies under `dir` instead of the system default.
    ///
    /// A relative `dir` is anchored at the current directory.
    pub fn with_scratch_root(mut self, dir: Option<PathBuf>) -> Self {
        self.scratch_root = dir.map(|dir| match std::path::absolute(&dir) {
            Ok(absolute) => normalize_path(&absolute),
            Err(_) => dir,
        });
        self
    }

    /// Synthesize `stack` into a fresh cloud assembly.
    ///
    /// `env` is applied to the subprocess on top of the inherited
    /// environment.
    #[instrument(skip_all, fields(stack_id = stack.stack_id().unwrap_or("<sole>")))]
    pub fn synthesize(
        &self,
        stack: &LoadedStack,
        synthesizer: &SynthesizerConfig,
        context: &SynthesisContext,
        env: &EnvironmentOverrides,
    ) -> HandlerResult<CloudAssembly> {
        let scratch = self.scratch_dir()?;
        let outdir = scratch.path().join(ASSEMBLY_DIR);

        let command = match stack {
            LoadedStack::Module {
                path,
                class_name,
                module_name,
                stack_id,
                working_dir,
                python_path,
            } => {
                let request = ShimRequest {
                    module_path: path,
                    module_name,
                    class_name,
                    stack_id,
                    outdir: &outdir,
                    context: &context.context,
                    user_data: &context.user_data,
                    parameters: &context.parameters,
                    synthesizer,
                };
                self.module_command(scratch.path(), &request, working_dir, python_path)?
            }
            LoadedStack::Project {
                project_dir,
                stack_id,
                ..
            } => self.project_command(
                scratch.path(),
                &outdir,
                project_dir,
                stack_id.as_deref(),
                synthesizer,
                context,
            )?,
        }
        .env(env.clone());

        info!(command = %command.display(), "Running CDK synthesis");
        let output = self
            .runner
            .run(&command, self.sink.as_ref())
            .map_err(|e| synthesis_failed(&command, "not started", e.to_string()))?;
        if !output.success() {
            return Err(failed_run(&command, &output));
        }

        CloudAssembly::open(scratch, outdir)
    }

    fn scratch_dir(&self) -> HandlerResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("sceptre-cdk-");
        let created = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        created.map_err(|e| {
            ApplicationError::FilesystemError {
                path: self.scratch_root.clone().unwrap_or_else(std::env::temp_dir),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn module_command(
        &self,
        scratch: &Path,
        request: &ShimRequest<'_>,
        working_dir: &Path,
        python_path: &[PathBuf],
    ) -> HandlerResult<CommandSpec> {
        let shim = scratch.join(SHIM_FILE);
        write_file(&shim, ENTRY_SHIM)?;
        let request_path = scratch.join(REQUEST_FILE);
        write_file(&request_path, &to_json(request)?)?;

        let joined = std::env::join_paths(python_path).map_err(|e| HandlerError::Internal {
            message: format!("module search path cannot be exported: {e}"),
        })?;
        let mut env = EnvironmentOverrides::default();
        env.set("PYTHONPATH", joined.to_string_lossy());

        Ok(CommandSpec::new(&self.toolchain.python)
            .path_arg(&shim)
            .path_arg(&request_path)
            .cwd(working_dir)
            .env(env))
    }

    fn project_command(
        &self,
        scratch: &Path,
        outdir: &Path,
        project_dir: &Path,
        stack_id: Option<&str>,
        synthesizer: &SynthesizerConfig,
        context: &SynthesisContext,
    ) -> HandlerResult<CommandSpec> {
        let user_data_path = scratch.join(USER_DATA_FILE);
        if context.has_user_data() {
            debug!(
                file = %user_data_path.display(),
                "CDK projects see sceptre_user_data only by reading {USER_DATA_ENV}"
            );
        }
        let side_channel = json!({
            "sceptre_user_data": context.user_data,
            "sceptre_parameters": context.parameters,
        });
        write_file(&user_data_path, &to_json(&side_channel)?)?;

        let mut env = EnvironmentOverrides::default();
        env.set(USER_DATA_ENV, user_data_path.to_string_lossy());
        for (key, value) in synthesizer.environment() {
            env.set(key, value);
        }

        let mut command = CommandSpec::new(&self.toolchain.npx).args(["cdk", "synth"]);
        if let Some(id) = stack_id {
            command = command.arg(id);
        }
        command = command.arg("-o").path_arg(outdir).arg("-q");
        for flag in context.context_flags() {
            command = command.arg("--context").arg(flag);
        }
        Ok(command.cwd(project_dir).env(env))
    }
}

fn to_json<T: Serialize>(value: &T) -> HandlerResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| HandlerError::Internal {
        message: format!("cannot serialize synthesis request: {e}"),
    })
}

fn write_file(path: &Path, contents: &str) -> HandlerResult<()> {
    fs::write(path, contents).map_err(|e| {
        ApplicationError::FilesystemError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn synthesis_failed(command: &CommandSpec, status: &str, output: String) -> HandlerError {
    ApplicationError::SynthesisFailed {
        command: command.display(),
        status: status.to_string(),
        output,
    }
    .into()
}

fn failed_run(command: &CommandSpec, output: &ProcessOutput) -> HandlerError {
    synthesis_failed(command, &output.status_display(), output.combined())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::DiscardOutput;
    use crate::application::services::testing::{FakeRunner, write_assembly};
    use crate::domain::{BootstraplessConfig, DEFAULT_STACK_LOGICAL_ID};
    use crate::error::Stage;

    fn module(dir: &Path) -> LoadedStack {
        LoadedStack::Module {
            path: dir.join("templates/stack.py"),
            class_name: "CdkStack".into(),
            module_name: "sceptre_cdk_stack_stack_x".into(),
            stack_id: DEFAULT_STACK_LOGICAL_ID.into(),
            working_dir: dir.to_path_buf(),
            python_path: vec![dir.join("templates")],
        }
    }

    fn project(dir: &Path, stack_id: Option<&str>) -> LoadedStack {
        LoadedStack::Project {
            descriptor: dir.join("cdk.json"),
            project_dir: dir.to_path_buf(),
            stack_id: stack_id.map(str::to_string),
        }
    }

    fn invoker(runner: &Arc<FakeRunner>) -> SynthesisInvoker {
        SynthesisInvoker::new(runner.clone(), Arc::new(DiscardOutput))
    }

    fn default_synth() -> SynthesizerConfig {
        SynthesizerConfig::Default { qualifier: None }
    }

    #[test]
    fn module_runs_shim_with_search_path() {
        let work = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(|spec| {
            let request_path = PathBuf::from(&spec.args[1]);
            let request: Value =
                serde_json::from_str(&fs::read_to_string(&request_path).unwrap()).unwrap();
            let outdir = PathBuf::from(request["outdir"].as_str().unwrap());
            write_assembly(&outdir, &["CDKStack"], None);
            ProcessOutput {
                status: Some(0),
                ..Default::default()
            }
        }));

        let assembly = invoker(&runner)
            .synthesize(
                &module(work.path()),
                &default_synth(),
                &SynthesisContext::default(),
                &EnvironmentOverrides::default(),
            )
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "python3");
        assert!(calls[0].args[0].ends_with(SHIM_FILE));
        assert_eq!(calls[0].cwd.as_deref(), Some(work.path()));
        assert_eq!(
            calls[0].env.get("PYTHONPATH"),
            Some(work.path().join("templates").to_string_lossy().as_ref())
        );
        assert_eq!(assembly.manifest().stack_ids(), vec!["CDKStack"]);
    }

    #[test]
    fn project_builds_cdk_synth_command() {
        let work = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(|spec| {
            let outdir = PathBuf::from(&spec.args[spec.args.iter().position(|a| a == "-o").unwrap() + 1]);
            write_assembly(&outdir, &["Api"], None);
            ProcessOutput {
                status: Some(0),
                ..Default::default()
            }
        }));

        let mut context = Map::new();
        context.insert("env".into(), json!("prod"));
        context.insert("replicas".into(), json!(3));
        let synthesizer = SynthesizerConfig::Bootstrapless {
            args: BootstraplessConfig {
                file_asset_bucket_name: Some("assets".into()),
                ..Default::default()
            },
        };

        invoker(&runner)
            .synthesize(
                &project(work.path(), Some("Api")),
                &synthesizer,
                &SynthesisContext::new(context, BTreeMap::new(), Value::Null),
                &EnvironmentOverrides::default(),
            )
            .unwrap();

        let call = &runner.calls()[0];
        assert_eq!(call.program, "npx");
        assert_eq!(&call.args[..3], ["cdk", "synth", "Api"]);
        assert!(call.args.contains(&"-q".to_string()));
        assert!(call.args.contains(&"env=prod".to_string()));
        assert!(call.args.contains(&"replicas=3".to_string()));
        assert_eq!(call.cwd.as_deref(), Some(work.path()));
        assert_eq!(call.env.get("BSS_FILE_ASSET_BUCKET_NAME"), Some("assets"));
        assert!(call.env.get(USER_DATA_ENV).is_some());
    }

    #[test]
    fn nonzero_exit_is_a_synthesis_error_with_output() {
        let work = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(|_| ProcessOutput {
            status: Some(1),
            stdout: String::new(),
            stderr: "ModuleNotFoundError: aws_cdk\n".into(),
        }));

        let err = invoker(&runner)
            .synthesize(
                &module(work.path()),
                &default_synth(),
                &SynthesisContext::default(),
                &EnvironmentOverrides::default(),
            )
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Synthesis);
        assert!(err.to_string().contains("ModuleNotFoundError"));
    }

    #[test]
    fn missing_manifest_is_a_synthesis_error() {
        let work = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(|_| ProcessOutput {
            status: Some(0),
            ..Default::default()
        }));

        let err = invoker(&runner)
            .synthesize(
                &project(work.path(), None),
                &default_synth(),
                &SynthesisContext::default(),
                &EnvironmentOverrides::default(),
            )
            .unwrap_err();
        assert_eq!(err.stage(), Stage::Synthesis);
    }

    #[test]
    fn scratch_dir_is_removed_when_assembly_closes() {
        let work = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new(|spec| {
            let outdir = PathBuf::from(&spec.args[spec.args.iter().position(|a| a == "-o").unwrap() + 1]);
            write_assembly(&outdir, &["Api"], None);
            ProcessOutput {
                status: Some(0),
                ..Default::default()
            }
        }));

        let assembly = invoker(&runner)
            .with_scratch_root(Some(scratch.path().to_path_buf()))
            .synthesize(
                &project(work.path(), None),
                &default_synth(),
                &SynthesisContext::default(),
                &EnvironmentOverrides::default(),
            )
            .unwrap();
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 1);
        assembly.close().unwrap();
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn relative_scratch_root_is_anchored() {
        let runner = Arc::new(FakeRunner::new(|_| ProcessOutput::default()));
        let invoker = invoker(&runner).with_scratch_root(Some(PathBuf::from("scratch/../tmp")));
        let root = invoker.scratch_root.unwrap();
        assert!(root.is_absolute());
        assert_eq!(root, std::env::current_dir().unwrap().join("tmp"));
    }

    #[test]
    fn template_is_rendered_as_sorted_yaml() {
        let template = json!({"Resources": {"B": {"Type": "x"}, "A": {"Type": "y"}}});
        let first = TemplateBody::from_json(&template).unwrap();
        let second = TemplateBody::from_json(&template).unwrap();
        assert_eq!(first, second);
        let body = first.as_str();
        assert!(body.find("A:").unwrap() < body.find("B:").unwrap());
    }
}
