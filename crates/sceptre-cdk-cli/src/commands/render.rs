//! `sceptre-cdk render`: synthesize one stack and print its template.

use std::fs;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use sceptre_cdk_adapters::{EnvSessionProvider, SystemProcessRunner, TracingOutputSink};
use sceptre_cdk_core::{
    application::{CdkHandler, HandleRequest, TemplateBody},
    domain::{StackConfig, normalize_path},
    error::HandlerError,
};

use crate::{
    cli::RenderArgs,
    config::AppConfig,
    error::{CliError, CliResult, IntoCli},
    output::OutputManager,
};

#[instrument(skip_all, fields(stack_file = %args.stack_file.display()))]
pub fn execute(args: RenderArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let request = build_request(&args, &config)?;
    debug!(
        project = %request.project_path.display(),
        region = %request.connection.region,
        publish = request.publish,
        "Stack config loaded"
    );

    let label = args
        .stack_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.info(&format!("Synthesizing {}", args.stack_file.display()))?;
    let handler = CdkHandler::new(
        Arc::new(SystemProcessRunner::new()),
        Arc::new(TracingOutputSink::labelled(label)),
        Box::new(EnvSessionProvider::from_env()),
    )
    .with_toolchain(config.toolchain())
    .with_scratch_root(config.synthesis.scratch_dir.clone());

    if args.validate {
        let plan = handler.validate(&request)?;
        output.success(&format!(
            "{} is valid ({} deployment of {})",
            args.stack_file.display(),
            plan.strategy.deployment_type(),
            plan.reference.path().display()
        ))?;
        return Ok(());
    }

    let template = match handler.handle(&request) {
        Ok(template) => template,
        Err(err) => {
            if let Some(template) = err.template() {
                write_template(&args, &output, template)?;
            }
            return Err(err.into());
        }
    };
    write_template(&args, &output, &template)?;

    if !request.publish {
        output.warning("Assets were not published")?;
    }
    Ok(())
}

fn write_template(
    args: &RenderArgs,
    output: &OutputManager,
    template: &TemplateBody,
) -> CliResult<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, template.as_str())
                .with_cli_context(|| format!("Failed to write template to {}", path.display()))?;
            info!(path = %path.display(), "Template written");
            output.success(&format!("Template written to {}", path.display()))?;
        }
        None => output.emit(template.as_str())?,
    }
    Ok(())
}

/// Read the stack file and turn it into a handler request.
fn build_request(args: &RenderArgs, config: &AppConfig) -> CliResult<HandleRequest> {
    if !args.stack_file.is_file() {
        return Err(CliError::StackFileNotFound {
            path: args.stack_file.clone(),
        });
    }
    let raw = fs::read_to_string(&args.stack_file)
        .with_cli_context(|| format!("Failed to read {}", args.stack_file.display()))?;
    let stack = StackConfig::from_yaml(&raw).map_err(HandlerError::from)?;

    let project_path = match &args.project_path {
        Some(path) if !path.is_dir() => {
            return Err(CliError::InvalidInput {
                message: format!("project path {} is not a directory", path.display()),
            });
        }
        Some(path) => std::path::absolute(path)
            .map(|p| normalize_path(&p))
            .with_cli_context(|| format!("Failed to resolve {}", path.display()))?,
        None => std::env::current_dir().with_cli_context(|| "Failed to read current directory")?,
    };

    let mut request =
        HandleRequest::from_stack_config(stack, project_path, args.region.as_deref())?;
    request.publish = config.synthesis.publish && !args.no_publish;
    Ok(request)
}
