//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "sceptre-cdk",
    bin_name = "sceptre-cdk",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Synthesize AWS CDK stacks into CloudFormation templates for Sceptre",
    long_about = "sceptre-cdk turns a CDK stack definition (a Python module or a \
                  cdk.json project) into a CloudFormation template and publishes \
                  its file and image assets.",
    after_help = "EXAMPLES:\n\
        \x20 sceptre-cdk render config/prod/lambda.yaml --project-path .\n\
        \x20 sceptre-cdk render config/dev/s3.yaml --no-publish -o s3.yaml\n\
        \x20 sceptre-cdk check --python\n\
        \x20 sceptre-cdk completions bash > /usr/share/bash-completion/completions/sceptre-cdk",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Synthesize a stack and print its template.
    #[command(
        visible_alias = "r",
        about = "Synthesize a stack and print its template",
        after_help = "EXAMPLES:\n\
            \x20 sceptre-cdk render stack.yaml\n\
            \x20 sceptre-cdk render stack.yaml --project-path ~/infra --output out.yaml\n\
            \x20 sceptre-cdk render stack.yaml --validate"
    )]
    Render(RenderArgs),

    /// Check that node, npx, cdk-assets (and python) are installed.
    #[command(
        about = "Check external prerequisites",
        after_help = "EXAMPLES:\n\
            \x20 sceptre-cdk check\n\
            \x20 sceptre-cdk check --python --output-format json"
    )]
    Check(CheckArgs),

    /// Print the JSON schema of the handler arguments.
    #[command(about = "Print the handler argument schema")]
    Schema,

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 sceptre-cdk completions bash > ~/.local/share/bash-completion/completions/sceptre-cdk\n\
            \x20 sceptre-cdk completions zsh  > ~/.zfunc/_sceptre-cdk\n\
            \x20 sceptre-cdk completions fish > ~/.config/fish/completions/sceptre-cdk.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the tool configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 sceptre-cdk config get tools.python\n\
            \x20 sceptre-cdk config list\n\
            \x20 sceptre-cdk config path"
    )]
    Config(ConfigCommands),
}

// ── render ────────────────────────────────────────────────────────────────────

/// Arguments for `sceptre-cdk render`.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Stack config file (YAML) with a `template:` block.
    #[arg(value_name = "STACK_FILE", help = "Stack config file")]
    pub stack_file: PathBuf,

    /// Sceptre project root; stack paths resolve under its `templates/`.
    #[arg(
        short = 'p',
        long = "project-path",
        value_name = "DIR",
        help = "Sceptre project directory (default: current directory)"
    )]
    pub project_path: Option<PathBuf>,

    /// Write the template here instead of stdout.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help = "Write the template to FILE"
    )]
    pub output: Option<PathBuf>,

    /// Region used when the stack file has none.
    #[arg(
        long = "region",
        value_name = "REGION",
        env = "AWS_DEFAULT_REGION",
        help = "Fallback AWS region"
    )]
    pub region: Option<String>,

    /// Synthesize without publishing assets.
    #[arg(long = "no-publish", help = "Skip asset publishing")]
    pub no_publish: bool,

    /// Check arguments and prerequisites only.
    #[arg(
        long = "validate",
        conflicts_with = "output",
        help = "Validate the stack config and prerequisites without synthesizing"
    )]
    pub validate: bool,
}

// ── check ─────────────────────────────────────────────────────────────────────

/// Arguments for `sceptre-cdk check`.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Also require a Python interpreter (single-module stacks).
    #[arg(long = "python", help = "Also check for the Python interpreter")]
    pub python: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `sceptre-cdk completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `sceptre-cdk config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `tools.python`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the default configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
