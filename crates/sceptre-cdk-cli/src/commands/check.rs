//! `sceptre-cdk check`: report which external programs are installed.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::instrument;

use sceptre_cdk_adapters::SystemProcessRunner;
use sceptre_cdk_core::application::{PrerequisiteChecker, PrerequisiteStatus};

use crate::{
    cli::{CheckArgs, OutputFormat},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all, fields(python = args.python))]
pub fn execute(args: CheckArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let statuses = PrerequisiteChecker::new(Arc::new(SystemProcessRunner::new()), config.toolchain())
        .report(args.python);

    if output.format() == OutputFormat::Json {
        output.emit_json(&report_json(&statuses))?;
    } else {
        output.header("Prerequisites")?;
        for status in &statuses {
            let line = format!("{} ({})", status.name, status.kind);
            if status.found {
                output.success(&line)?;
            } else {
                output.error(&format!("{line} not found"))?;
            }
        }
    }

    let missing = missing(&statuses);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CliError::PrerequisitesMissing { missing })
    }
}

fn missing(statuses: &[PrerequisiteStatus]) -> Vec<String> {
    statuses
        .iter()
        .filter(|s| !s.found)
        .map(|s| s.name.clone())
        .collect()
}

fn report_json(statuses: &[PrerequisiteStatus]) -> Value {
    statuses
        .iter()
        .map(|s| json!({"name": s.name, "kind": s.kind.as_str(), "found": s.found}))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceptre_cdk_core::application::PrerequisiteKind;

    fn statuses() -> Vec<PrerequisiteStatus> {
        vec![
            PrerequisiteStatus {
                name: "node".into(),
                kind: PrerequisiteKind::Command,
                found: true,
            },
            PrerequisiteStatus {
                name: "cdk-assets".into(),
                kind: PrerequisiteKind::NodePackage,
                found: false,
            },
        ]
    }

    #[test]
    fn lists_only_missing_names() {
        assert_eq!(missing(&statuses()), vec!["cdk-assets".to_string()]);
    }

    #[test]
    fn json_report_has_one_entry_per_check() {
        let report = report_json(&statuses());
        assert_eq!(report.as_array().unwrap().len(), 2);
        assert_eq!(report[1]["kind"], "node package");
        assert_eq!(report[1]["found"], false);
    }
}
