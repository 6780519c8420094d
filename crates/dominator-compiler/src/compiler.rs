//! Main compiler
//!
//! Drives one template through every stage and exposes the intermediate results.

use crate::codegen::{JsCodegen, JsCodegenOptions};
use crate::error::Result;
use crate::optimizer::{Optimizer, OptimizerOptions};
use crate::semantic::IrValidator;
use crate::ssa::SsaBuilder;
use dominator_core::ast::Node;
use dominator_core::ir::Program;
use dominator_parser::{ParseMode, ParserOptions, TemplateParser};

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Name of the exported render procedure
    pub function_name: String,
    /// Module `effect` is imported from
    pub runtime_module: String,
    /// Parser strictness
    pub parse_mode: ParseMode,
    /// Record static subtrees while lowering
    pub enable_static_analysis: bool,
    /// Drop empty text nodes
    pub enable_dead_code_elimination: bool,
    /// Turn literal expressions into text
    pub enable_constant_folding: bool,
    /// Collapse static subtrees into cloned fragments
    pub enable_static_hoisting: bool,
    /// Check the optimized instruction stream before code generation
    pub validate_ir: bool,
    /// First value id handed out
    pub id_seed: u32,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            function_name: "render".to_string(),
            runtime_module: JsCodegenOptions::default().runtime_module,
            parse_mode: ParseMode::Strict,
            enable_static_analysis: true,
            enable_dead_code_elimination: true,
            enable_constant_folding: true,
            enable_static_hoisting: true,
            validate_ir: true,
            id_seed: 0,
        }
    }
}

impl CompilerOptions {
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    pub fn with_runtime_module(mut self, module: impl Into<String>) -> Self {
        self.runtime_module = module.into();
        self
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    pub fn with_id_seed(mut self, seed: u32) -> Self {
        self.id_seed = seed;
        self
    }

    /// Enable or disable every optimization pass at once
    pub fn with_optimizations(mut self, enabled: bool) -> Self {
        self.enable_static_analysis = enabled;
        self.enable_dead_code_elimination = enabled;
        self.enable_constant_folding = enabled;
        self.enable_static_hoisting = enabled;
        self
    }

    fn optimizer_options(&self) -> OptimizerOptions {
        OptimizerOptions {
            dead_code_elimination: self.enable_dead_code_elimination,
            constant_folding: self.enable_constant_folding,
            static_hoisting: self.enable_static_hoisting,
        }
    }
}

/// Output of a full compile
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// Optimized, validated instruction stream
    pub program: Program,
    /// Generated JavaScript module
    pub code: String,
}

/// The template compiler
pub struct Compiler {
    options: CompilerOptions,
    parser: TemplateParser,
    optimizer: Optimizer,
    codegen: JsCodegen,
}

impl Compiler {
    /// Create a compiler with default options
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    /// Create a compiler with custom options
    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            parser: TemplateParser::with_options(ParserOptions::new().with_mode(options.parse_mode)),
            optimizer: Optimizer::with_options(options.optimizer_options()),
            codegen: JsCodegen::with_options(JsCodegenOptions {
                runtime_module: options.runtime_module.clone(),
            }),
            options,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Parse template source into an AST
    pub fn parse(&self, source: &str) -> Result<Node> {
        Ok(self.parser.parse(source)?)
    }

    /// Lower an AST into an unoptimized program
    pub fn lower(&self, ast: &Node) -> Result<Program> {
        SsaBuilder::with_seed(self.options.id_seed)
            .with_function_name(self.options.function_name.clone())
            .with_static_analysis(self.options.enable_static_analysis)
            .build(ast)
    }

    /// Parse, lower, optimize and validate
    pub fn compile_to_ir(&self, source: &str) -> Result<Program> {
        let ast = self.parse(source)?;
        let program = self.lower(&ast)?;
        let program = self.optimizer.optimize(&program);

        if self.options.validate_ir {
            IrValidator::validate(&program)?;
        }

        tracing::debug!(
            function = %program.metadata.name,
            instructions = program.instruction_count(),
            "compiled template to IR"
        );
        Ok(program)
    }

    /// Generate JavaScript for an already lowered program
    pub fn generate(&self, program: &Program) -> Result<String> {
        Ok(self.codegen.generate(program)?)
    }

    /// Full pipeline, keeping the IR next to the generated code
    pub fn compile(&self, source: &str) -> Result<CompiledTemplate> {
        let program = self.compile_to_ir(source)?;
        let code = self.generate(&program)?;
        Ok(CompiledTemplate { program, code })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile template source into a JavaScript module exporting `function_name`
/// (`render` when absent). Output is byte-identical for identical input.
pub fn compile(source: &str, function_name: Option<&str>) -> Result<String> {
    let mut options = CompilerOptions::default();
    if let Some(name) = function_name {
        options.function_name = name.to_string();
    }
    Ok(Compiler::with_options(options).compile(source)?.code)
}
