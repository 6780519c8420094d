//! Code generation module
//!
//! Turns an optimized program into JavaScript source.

pub mod free_vars;
pub mod js_codegen;
pub mod writer;

pub use free_vars::free_identifiers;
pub use js_codegen::{JsCodegen, JsCodegenOptions};
pub use writer::CodeWriter;
