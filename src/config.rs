//! CLI configuration
//!
//! Layered: built-in defaults, then an optional `dominator.toml` (or any format the
//! `config` crate recognizes under that base name), then `DOMINATOR_*` environment
//! variables. Command-line flags are applied last by the caller.

use anyhow::{Context, Result};
use dominator_compiler::CompilerOptions;
use dominator_parser::ParseMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings that shape every compile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Name of the exported render procedure
    pub function_name: String,

    /// Module the generated code imports `effect` from
    pub runtime_module: String,

    /// `strict` or `lax`
    pub parse_mode: ParseMode,

    /// Run the optimizer passes
    pub optimize: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        let options = CompilerOptions::default();
        Self {
            function_name: options.function_name,
            runtime_module: options.runtime_module,
            parse_mode: options.parse_mode,
            optimize: true,
        }
    }
}

impl CliConfig {
    /// Load from `./dominator.*` and the environment, after reading `.env`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("dominator"))
    }

    /// Load with `base` as the config file name without extension
    pub fn load_from(base: &Path) -> Result<Self> {
        let name = base.to_string_lossy();
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(&name).required(false))
            .add_source(config::Environment::with_prefix("DOMINATOR").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", name))?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions::default()
            .with_function_name(self.function_name.clone())
            .with_runtime_module(self.runtime_module.clone())
            .with_parse_mode(self.parse_mode)
            .with_optimizations(self.optimize)
    }
}
