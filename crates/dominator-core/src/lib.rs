//! Dominator Core - Core types and definitions for the Dominator toolchain
//!
//! This crate provides the fundamental types shared by the parser, compiler and runtime:
//! - AST (Abstract Syntax Tree) definitions for templates
//! - IR (Intermediate Representation) instruction stream definitions
//! - Runtime value types
//! - Error types

pub mod ast;
pub mod error;
pub mod ir;
pub mod types;

// Re-export commonly used types
pub use ast::{Attribute, AttributeValue, Attributes, Node, SourceLocation};
pub use error::CoreError;
pub use ir::{Block, Instruction, Program, ValueId};
pub use types::Value;
