//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the [`Toolchain`] and
//! scratch directory derived from it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables, `SCEPTRE_CDK__<SECTION>__<KEY>`
//! 3. Config file (`--config`, or the platform config directory)
//! 4. Built-in defaults (always present)

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use sceptre_cdk_core::application::Toolchain;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SCEPTRE_CDK";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External programs.
    pub tools: ToolsConfig,
    /// Synthesis settings.
    pub synthesis: SynthesisConfig,
    /// Output settings.
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub npx: String,
    pub npm: String,
    pub node: String,
    pub python: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let toolchain = Toolchain::default();
        Self {
            npx: toolchain.npx,
            npm: toolchain.npm,
            node: toolchain.node,
            python: toolchain.python,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Parent for per-run assembly directories; the system temp dir if unset.
    pub scratch_dir: Option<PathBuf>,
    /// Publish assets after synthesis.
    pub publish: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            scratch_dir: None,
            publish: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub no_color: bool,
}

impl AppConfig {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// An explicit `config_file` must exist; the default location is
    /// optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        match config_file {
            Some(path) => Self::load_from(path, true, None),
            None => Self::load_from(&Self::config_path(), false, None),
        }
    }

    /// Load with an explicit environment map; `None` reads the process
    /// environment.
    pub fn load_from(
        path: &Path,
        required: bool,
        env: Option<HashMap<String, String>>,
    ) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to build default configuration")?;

        config::Config::builder()
            .add_source(defaults)
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.sceptre-cdk.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("org", "sceptre", "sceptre-cdk")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".sceptre-cdk.toml"))
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            npx: self.tools.npx.clone(),
            npm: self.tools.npm.clone(),
            node: self.tools.node.clone(),
            python: self.tools.python.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn defaults_match_toolchain() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.toolchain(), Toolchain::default());
        assert!(cfg.synthesis.publish);
        assert!(!cfg.output.no_color);
    }

    #[test]
    fn missing_optional_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml"), false, no_env()).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load_from(&dir.path().join("absent.toml"), true, no_env()).is_err());
    }

    #[test]
    fn file_overrides_defaults_partially() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tools]\npython = \"python3.12\"\n\n[synthesis]\npublish = false\n")
            .unwrap();

        let cfg = AppConfig::load_from(&path, true, no_env()).unwrap();
        assert_eq!(cfg.tools.python, "python3.12");
        assert_eq!(cfg.tools.npx, "npx");
        assert!(!cfg.synthesis.publish);
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[tools]\nnode = \"/opt/node/bin/node\"\n").unwrap();
        let env = HashMap::from([
            ("SCEPTRE_CDK__TOOLS__NODE".to_string(), "nodejs".to_string()),
            ("SCEPTRE_CDK__OUTPUT__NO_COLOR".to_string(), "true".to_string()),
        ]);

        let cfg = AppConfig::load_from(&path, true, Some(env)).unwrap();
        assert_eq!(cfg.tools.node, "nodejs");
        assert!(cfg.output.no_color);
    }

    #[test]
    fn config_path_is_not_empty() {
        assert!(!AppConfig::config_path().as_os_str().is_empty());
    }
}
