//! Abstract Syntax Tree (AST) definitions for Dominator templates
//!
//! This module contains the AST node definitions for:
//! - Elements and components
//! - Text runs and embedded expressions
//! - Control-flow blocks (`each`, `if`, `else`)
//! - Attributes and source locations

pub mod attribute;
pub mod location;
pub mod node;

pub use attribute::{Attribute, AttributeValue, Attributes};
pub use location::SourceLocation;
pub use node::{EachBlock, Element, ElseBlock, Expression, IfBlock, Node, Program, Text};
