//! SSA lowering
//!
//! Turns the template AST into the static-single-id instruction stream.

pub mod builder;

pub use builder::SsaBuilder;
