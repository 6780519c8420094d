//! Instruction-stream rendering
//!
//! Runs a compiled [`Program`](dominator_core::ir::Program) directly against a
//! [`Document`](crate::dom::Document), wiring dynamic parts to the reactive core.

pub mod evaluator;
pub mod renderer;
pub mod scope;

pub use evaluator::{Evaluator, PathEvaluator};
pub use renderer::{Rendered, Renderer};
pub use scope::{Binding, Scope};
