//! Semantic analysis module
//!
//! Static-subtree classification over the AST and structural validation of the
//! lowered instruction stream.

pub mod ir_validator;
pub mod static_analyzer;

// Re-export for convenience
pub use ir_validator::IrValidator;
pub use static_analyzer::{is_static_node, StaticAnalyzer, StaticHints};
