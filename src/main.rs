//! Dominator command-line driver
//!
//! Compiles template files to JavaScript modules, checks them, or dumps their IR.

mod commands;
mod config;

use crate::config::CliConfig;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dominator_parser::ParseMode;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dominator")]
#[command(version, about = "Compile reactive templates to JavaScript")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a template to a JavaScript module
    Compile {
        #[command(flatten)]
        template: TemplateArgs,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a template compiles
    Check {
        #[command(flatten)]
        template: TemplateArgs,
    },

    /// Print the optimized IR as JSON
    Ir {
        #[command(flatten)]
        template: TemplateArgs,
    },
}

#[derive(Args)]
struct TemplateArgs {
    /// Template file
    input: PathBuf,

    /// Name of the exported render procedure
    #[arg(long)]
    name: Option<String>,

    /// Tolerate mismatched and missing close tags
    #[arg(long)]
    lax: bool,

    /// Skip the optimizer passes
    #[arg(long)]
    no_optimize: bool,
}

impl TemplateArgs {
    /// Flags win over file and environment settings
    fn apply(&self, mut config: CliConfig) -> CliConfig {
        if let Some(name) = &self.name {
            config.function_name = name.clone();
        }
        if self.lax {
            config.parse_mode = ParseMode::Lax;
        }
        if self.no_optimize {
            config.optimize = false;
        }
        config
    }
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = CliConfig::load()?;

    match cli.command {
        Command::Compile { template, output } => {
            let config = template.apply(config);
            if let Some(code) = commands::compile(&template.input, output.as_deref(), &config)? {
                print!("{}", code);
            }
        }
        Command::Check { template } => {
            let config = template.apply(config);
            println!("{}", commands::check(&template.input, &config)?);
        }
        Command::Ir { template } => {
            let config = template.apply(config);
            println!("{}", commands::ir(&template.input, &config)?);
        }
    }
    Ok(())
}

/// Initialize tracing subscriber; logs go to stderr so stdout stays clean for output
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dominator=info,dominator_compiler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "dominator",
            "compile",
            "view.dom",
            "--name",
            "view",
            "--lax",
            "--no-optimize",
            "-o",
            "view.js",
        ]);
        let Command::Compile { template, output } = cli.command else {
            panic!("expected compile");
        };

        let config = template.apply(CliConfig::default());
        assert_eq!(config.function_name, "view");
        assert_eq!(config.parse_mode, ParseMode::Lax);
        assert!(!config.optimize);
        assert_eq!(output, Some(PathBuf::from("view.js")));
        assert_eq!(template.input, PathBuf::from("view.dom"));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = Cli::parse_from(["dominator", "check", "view.dom"]);
        let Command::Check { template } = cli.command else {
            panic!("expected check");
        };

        let config = CliConfig {
            function_name: "fromfile".to_string(),
            ..CliConfig::default()
        };
        assert_eq!(template.apply(config.clone()), config);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
