//! Subcommand implementations

use crate::config::CliConfig;
use anyhow::{Context, Result};
use dominator_compiler::Compiler;
use std::fs;
use std::path::Path;
use tracing::info;

fn read_template(input: &Path) -> Result<String> {
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

/// Compile `input` to a JavaScript module; writes to `output` or returns the code
pub fn compile(input: &Path, output: Option<&Path>, config: &CliConfig) -> Result<Option<String>> {
    let source = read_template(input)?;
    let compiled = Compiler::with_options(config.compiler_options())
        .compile(&source)
        .with_context(|| format!("Failed to compile {}", input.display()))?;

    info!(
        input = %input.display(),
        function = %config.function_name,
        instructions = compiled.program.instruction_count(),
        "compiled template"
    );

    match output {
        Some(path) => {
            fs::write(path, &compiled.code)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(output = %path.display(), bytes = compiled.code.len(), "wrote module");
            Ok(None)
        }
        None => Ok(Some(compiled.code)),
    }
}

/// Parse, lower, optimize and validate without generating code
pub fn check(input: &Path, config: &CliConfig) -> Result<String> {
    let source = read_template(input)?;
    let program = Compiler::with_options(config.compiler_options())
        .compile_to_ir(&source)
        .with_context(|| format!("{} is not a valid template", input.display()))?;

    Ok(format!(
        "{}: ok ({} instructions, {} total)",
        input.display(),
        program.instruction_count(),
        program.block.total_len()
    ))
}

/// Optimized IR as pretty-printed JSON
pub fn ir(input: &Path, config: &CliConfig) -> Result<String> {
    let source = read_template(input)?;
    let program = Compiler::with_options(config.compiler_options())
        .compile_to_ir(&source)
        .with_context(|| format!("Failed to compile {}", input.display()))?;

    serde_json::to_string_pretty(&program).context("Failed to serialize IR")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dominator_core::ir::Program;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn template(dir: &TempDir, source: &str) -> PathBuf {
        let path = dir.path().join("view.dom");
        fs::write(&path, source).unwrap();
        path
    }

    #[test]
    fn test_compile_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = template(&dir, r#"<div class="x">{name}</div>"#);
        let output = dir.path().join("view.js");

        let printed = compile(&input, Some(&output), &CliConfig::default()).unwrap();
        assert!(printed.is_none());

        let code = fs::read_to_string(&output).unwrap();
        assert!(code.starts_with("import { effect } from '@dominator/core';"));
        assert!(code.contains("export const render = (state, events) => {"));
    }

    #[test]
    fn test_compile_to_stdout_uses_config() {
        let dir = tempfile::tempdir().unwrap();
        let input = template(&dir, "<p>{x}</p>");
        let config = CliConfig {
            function_name: "view".to_string(),
            runtime_module: "./runtime.js".to_string(),
            ..CliConfig::default()
        };

        let code = compile(&input, None, &config).unwrap().unwrap();
        assert!(code.starts_with("import { effect } from './runtime.js';"));
        assert!(code.contains("export const view = "));
    }

    #[test]
    fn test_check_reports_errors() {
        let dir = tempfile::tempdir().unwrap();
        let input = template(&dir, "<div></span>");

        let err = check(&input, &CliConfig::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("expected </div>, found </span>"));

        let lax = CliConfig {
            parse_mode: dominator_parser::ParseMode::Lax,
            ..CliConfig::default()
        };
        assert!(check(&input, &lax).unwrap().ends_with("ok (1 instructions, 1 total)"));
    }

    #[test]
    fn test_ir_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = template(&dir, "{#each items as item}<li>{item}</li>{/each}");

        let json = ir(&input, &CliConfig::default()).unwrap();
        let program: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(program.block.total_len(), 4);
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let err = check(&dir.path().join("nope.dom"), &CliConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }
}
