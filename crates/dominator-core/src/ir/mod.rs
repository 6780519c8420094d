//! Intermediate Representation (IR) for Dominator templates
//!
//! The IR is a linear, static-single-id instruction stream. Control-flow
//! instructions carry nested blocks instead of being flattened.

pub mod instruction;
pub mod program;
pub mod static_node;

pub use instruction::{Instruction, Opcode, ValueId};
pub use program::{Block, Program, ProgramMetadata};
pub use static_node::StaticNode;
