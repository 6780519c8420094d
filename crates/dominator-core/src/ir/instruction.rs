//! IR Instructions
//!
//! Node-construction instructions produced by the SSA builder. Every value-producing
//! instruction defines a fresh [`ValueId`] that is never reassigned.

use crate::ast::AttributeValue;
use crate::ir::program::Block;
use crate::ir::static_node::StaticNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compiler-generated value identifier, rendered as `v0`, `v1`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A single IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Instruction {
    // ===== Node Creation =====
    /// Allocate an element (or instantiate a component)
    Create {
        target: ValueId,
        tag: String,
        component: bool,
    },

    /// Create a static text node
    Text { target: ValueId, value: String },

    /// Create a text node bound to an expression
    Expr { target: ValueId, expression: String },

    /// Precomputed static fragment
    Static { target: ValueId, node: StaticNode },

    // ===== Node Decoration =====
    /// Assign an attribute on `target`
    Attr {
        target: ValueId,
        name: String,
        value: AttributeValue,
    },

    /// Register an event listener on `target`
    Event {
        target: ValueId,
        /// Lower-cased event name without the `on` prefix
        event: String,
        handler: AttributeValue,
    },

    /// Attach `child` to `target`
    Append { target: ValueId, child: ValueId },

    // ===== Control Flow =====
    /// Render `body` once per element of `iterable`
    Each {
        target: ValueId,
        iterable: String,
        binding: String,
        key: Option<String>,
        body: Block,
    },

    /// Render `then_block` or `else_block` depending on `condition`
    If {
        target: ValueId,
        condition: String,
        then_block: Block,
        else_block: Option<Block>,
    },
}

/// Operation code of an instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Create,
    Attr,
    Event,
    Text,
    Expr,
    Append,
    Each,
    If,
    Static,
}

impl Opcode {
    /// Get the name of this opcode
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Create => "create",
            Opcode::Attr => "attr",
            Opcode::Event => "event",
            Opcode::Text => "text",
            Opcode::Expr => "expr",
            Opcode::Append => "append",
            Opcode::Each => "each",
            Opcode::If => "if",
            Opcode::Static => "static",
        }
    }
}

impl Instruction {
    /// The instruction's target id
    pub fn target(&self) -> ValueId {
        match self {
            Instruction::Create { target, .. }
            | Instruction::Text { target, .. }
            | Instruction::Expr { target, .. }
            | Instruction::Static { target, .. }
            | Instruction::Attr { target, .. }
            | Instruction::Event { target, .. }
            | Instruction::Append { target, .. }
            | Instruction::Each { target, .. }
            | Instruction::If { target, .. } => *target,
        }
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Create { .. } => Opcode::Create,
            Instruction::Text { .. } => Opcode::Text,
            Instruction::Expr { .. } => Opcode::Expr,
            Instruction::Static { .. } => Opcode::Static,
            Instruction::Attr { .. } => Opcode::Attr,
            Instruction::Event { .. } => Opcode::Event,
            Instruction::Append { .. } => Opcode::Append,
            Instruction::Each { .. } => Opcode::Each,
            Instruction::If { .. } => Opcode::If,
        }
    }

    /// Whether this instruction defines its target (as opposed to decorating it)
    pub fn defines_value(&self) -> bool {
        !matches!(
            self,
            Instruction::Attr { .. } | Instruction::Event { .. } | Instruction::Append { .. }
        )
    }

    /// Child argument of an `append`
    pub fn appended_child(&self) -> Option<ValueId> {
        match self {
            Instruction::Append { child, .. } => Some(*child),
            _ => None,
        }
    }

    /// Nested instruction blocks carried by control-flow instructions
    pub fn nested_blocks(&self) -> Vec<&Block> {
        match self {
            Instruction::Each { body, .. } => vec![body],
            Instruction::If {
                then_block,
                else_block,
                ..
            } => {
                let mut blocks = vec![then_block];
                blocks.extend(else_block.iter());
                blocks
            }
            _ => Vec::new(),
        }
    }

    /// Mutable access to nested blocks
    pub fn nested_blocks_mut(&mut self) -> Vec<&mut Block> {
        match self {
            Instruction::Each { body, .. } => vec![body],
            Instruction::If {
                then_block,
                else_block,
                ..
            } => {
                let mut blocks = vec![then_block];
                blocks.extend(else_block.iter_mut());
                blocks
            }
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode().name();
        match self {
            Instruction::Create { target, tag, .. } => write!(f, "{op} {target} {tag}"),
            Instruction::Text { target, value } => write!(f, "{op} {target} {value:?}"),
            Instruction::Expr { target, expression } => write!(f, "{op} {target} {{{expression}}}"),
            Instruction::Static { target, node } => write!(f, "{op} {target} {}", node.to_html()),
            Instruction::Attr {
                target,
                name,
                value,
            } => write!(f, "{op} {target} {name}={value:?}"),
            Instruction::Event {
                target,
                event,
                handler,
            } => write!(f, "{op} {target} {event}={handler:?}"),
            Instruction::Append { target, child } => write!(f, "{op} {target} <- {child}"),
            Instruction::Each {
                target,
                iterable,
                binding,
                body,
                ..
            } => write!(
                f,
                "{op} {target} {iterable} as {binding} [{} instructions]",
                body.len()
            ),
            Instruction::If {
                target,
                condition,
                then_block,
                else_block,
            } => write!(
                f,
                "{op} {target} {condition} [{} / {} instructions]",
                then_block.len(),
                else_block.as_ref().map_or(0, Block::len)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_id_display() {
        assert_eq!(ValueId(0).to_string(), "v0");
        assert_eq!(ValueId(17).to_string(), "v17");
    }

    #[test]
    fn test_defines_value() {
        let create = Instruction::Create {
            target: ValueId(0),
            tag: "div".to_string(),
            component: false,
        };
        let append = Instruction::Append {
            target: ValueId(0),
            child: ValueId(1),
        };

        assert!(create.defines_value());
        assert!(!append.defines_value());
        assert_eq!(append.appended_child(), Some(ValueId(1)));
        assert_eq!(create.appended_child(), None);
    }

    #[test]
    fn test_nested_blocks() {
        let inst = Instruction::If {
            target: ValueId(0),
            condition: "ok".to_string(),
            then_block: Block::new(),
            else_block: Some(Block::new()),
        };
        assert_eq!(inst.nested_blocks().len(), 2);
        assert_eq!(inst.opcode(), Opcode::If);
        assert_eq!(inst.opcode().name(), "if");
    }

    #[test]
    fn test_display() {
        let inst = Instruction::Append {
            target: ValueId(0),
            child: ValueId(3),
        };
        assert_eq!(inst.to_string(), "append v0 <- v3");

        let inst = Instruction::Expr {
            target: ValueId(1),
            expression: "name".to_string(),
        };
        assert_eq!(inst.to_string(), "expr v1 {name}");
    }

    #[test]
    fn test_instruction_serde() {
        let inst = Instruction::Attr {
            target: ValueId(2),
            name: "class".to_string(),
            value: AttributeValue::Literal("x".to_string()),
        };

        let json = serde_json::to_string(&inst).unwrap();
        assert!(json.contains("Attr"));

        let deserialized: Instruction = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, inst);
    }
}
