//! IR Program
//!
//! A program is a top-level instruction block with associated metadata.

use crate::ir::{Instruction, ValueId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// An ordered instruction list scoped to one fragment
///
/// `root` is recorded by the SSA builder. By convention it is also the unique id
/// defined in this list that no `append` in the same list claims as a child.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub instructions: Vec<Instruction>,
    pub root: Option<ValueId>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block and derive its root from the instructions
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        let mut block = Self {
            instructions,
            root: None,
        };
        block.recompute_root();
        block
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Ids defined by this list, in definition order (nested blocks excluded)
    pub fn defined_ids(&self) -> Vec<ValueId> {
        self.instructions
            .iter()
            .filter(|inst| inst.defines_value())
            .map(Instruction::target)
            .collect()
    }

    /// Defined ids that no `append` in this list claims as a child
    pub fn unclaimed_ids(&self) -> Vec<ValueId> {
        let claimed: HashSet<ValueId> = self
            .instructions
            .iter()
            .filter_map(Instruction::appended_child)
            .collect();

        self.defined_ids()
            .into_iter()
            .filter(|id| !claimed.contains(id))
            .collect()
    }

    /// Reset `root` from the unclaimed-id convention (`None` unless exactly one)
    pub fn recompute_root(&mut self) {
        let unclaimed = self.unclaimed_ids();
        self.root = match unclaimed.as_slice() {
            [root] => Some(*root),
            _ => None,
        };
    }

    /// Visit every instruction, nested blocks included, with its nesting depth
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Instruction, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Instruction, usize)) {
        for inst in &self.instructions {
            visit(inst, depth);
            for nested in inst.nested_blocks() {
                nested.walk_at(depth + 1, visit);
            }
        }
    }

    /// Number of instructions including nested blocks
    pub fn total_len(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _| count += 1);
        count
    }
}

/// A compiled template ready for code generation or execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Top-level instruction block
    pub block: Block,

    /// Create ids whose AST subtree was classified static
    #[serde(default)]
    pub static_hints: BTreeSet<ValueId>,

    /// Program metadata
    pub metadata: ProgramMetadata,
}

/// Metadata associated with a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMetadata {
    /// Name of the generated procedure
    pub name: String,

    /// Custom metadata fields
    #[serde(default)]
    pub custom: HashMap<String, String>,

    /// Version of the compiler that generated this
    pub compiler_version: String,
}

impl Program {
    /// Create a new program
    pub fn new(block: Block, metadata: ProgramMetadata) -> Self {
        Self {
            block,
            static_hints: BTreeSet::new(),
            metadata,
        }
    }

    /// Attach static-subtree hints
    pub fn with_static_hints(mut self, hints: BTreeSet<ValueId>) -> Self {
        self.static_hints = hints;
        self
    }

    /// Get the number of top-level instructions
    pub fn instruction_count(&self) -> usize {
        self.block.len()
    }

    /// Check if program is empty
    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    /// Root of the top-level fragment
    pub fn root(&self) -> Option<ValueId> {
        self.block.root
    }
}

impl ProgramMetadata {
    /// Create new metadata for a template procedure
    pub fn for_template(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom: HashMap::new(),
            compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Add a custom metadata field
    pub fn with_custom(mut self, key: String, value: String) -> Self {
        self.custom.insert(key, value);
        self
    }
}

impl Default for ProgramMetadata {
    fn default() -> Self {
        Self::for_template("render")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AttributeValue;

    fn div_with_text() -> Vec<Instruction> {
        vec![
            Instruction::Create {
                target: ValueId(0),
                tag: "div".to_string(),
                component: false,
            },
            Instruction::Attr {
                target: ValueId(0),
                name: "class".to_string(),
                value: AttributeValue::Literal("x".to_string()),
            },
            Instruction::Text {
                target: ValueId(1),
                value: "hi".to_string(),
            },
            Instruction::Append {
                target: ValueId(0),
                child: ValueId(1),
            },
        ]
    }

    #[test]
    fn test_unclaimed_root() {
        let block = Block::from_instructions(div_with_text());

        assert_eq!(block.defined_ids(), vec![ValueId(0), ValueId(1)]);
        assert_eq!(block.unclaimed_ids(), vec![ValueId(0)]);
        assert_eq!(block.root, Some(ValueId(0)));
    }

    #[test]
    fn test_multiple_unclaimed_has_no_root() {
        let block = Block::from_instructions(vec![
            Instruction::Text {
                target: ValueId(0),
                value: "a".to_string(),
            },
            Instruction::Text {
                target: ValueId(1),
                value: "b".to_string(),
            },
        ]);

        assert_eq!(block.unclaimed_ids().len(), 2);
        assert_eq!(block.root, None);
    }

    #[test]
    fn test_walk_counts_nested() {
        let mut instructions = div_with_text();
        instructions.push(Instruction::Each {
            target: ValueId(2),
            iterable: "items".to_string(),
            binding: "item".to_string(),
            key: None,
            body: Block::from_instructions(vec![Instruction::Expr {
                target: ValueId(3),
                expression: "item".to_string(),
            }]),
        });
        instructions.push(Instruction::Append {
            target: ValueId(0),
            child: ValueId(2),
        });
        let block = Block::from_instructions(instructions);

        let mut max_depth = 0;
        block.walk(&mut |_, depth| max_depth = max_depth.max(depth));

        assert_eq!(block.total_len(), 7);
        assert_eq!(max_depth, 1);
        assert_eq!(block.root, Some(ValueId(0)));
    }

    #[test]
    fn test_program_serde() {
        let program = Program::new(
            Block::from_instructions(div_with_text()),
            ProgramMetadata::for_template("render"),
        );

        let json = serde_json::to_string_pretty(&program).unwrap();
        assert!(json.contains("render"));

        let deserialized: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, program);
        assert_eq!(deserialized.root(), Some(ValueId(0)));
    }
}
