//! `sceptre-cdk schema`: the JSON schema of the `template:` block.

use sceptre_cdk_core::domain::handler_schema;

use crate::{error::CliResult, output::OutputManager};

pub fn execute(output: OutputManager) -> CliResult<()> {
    output.emit_json(&handler_schema())?;
    Ok(())
}
