//! Dominator Compiler - template to reactive JavaScript
//!
//! Pipeline: parse → static analysis → SSA lowering → optimization → IR validation →
//! JavaScript code generation.

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod optimizer;
pub mod semantic;
pub mod ssa;

// Re-export main types
pub use compiler::{compile, CompiledTemplate, Compiler, CompilerOptions};
pub use error::{CompileError, LoweringError, Result};

// Re-export pipeline stages
pub use codegen::{JsCodegen, JsCodegenOptions};
pub use optimizer::{ConstantFolder, DeadCodeEliminator, Optimizer, OptimizerOptions, StaticHoister};
pub use semantic::{is_static_node, IrValidator, StaticAnalyzer, StaticHints};
pub use ssa::SsaBuilder;
