//! Dead code elimination optimizer
//!
//! Removes instructions that cannot affect the rendered tree.

use dominator_core::ir::{Block, Instruction, Program, ValueId};
use std::collections::HashSet;

/// Dead code eliminator
pub struct DeadCodeEliminator;

impl DeadCodeEliminator {
    /// Create a new dead code eliminator
    pub fn new() -> Self {
        Self
    }

    /// Drop empty `text` instructions and the `append`s that attach them
    pub fn eliminate(&self, program: &Program) -> Program {
        let mut optimized = program.clone();
        let removed = self.eliminate_block(&mut optimized.block);
        if removed > 0 {
            tracing::debug!(removed, "dead code elimination");
        }
        optimized
    }

    fn eliminate_block(&self, block: &mut Block) -> usize {
        let dead: HashSet<ValueId> = block
            .instructions
            .iter()
            .filter(|inst| is_empty_text(inst))
            .map(Instruction::target)
            .collect();

        let before = block.instructions.len();
        block.instructions.retain(|inst| match inst {
            Instruction::Text { target, .. } => !dead.contains(target),
            Instruction::Append { child, .. } => !dead.contains(child),
            _ => true,
        });
        let mut removed = before - block.instructions.len();

        for inst in &mut block.instructions {
            for nested in inst.nested_blocks_mut() {
                removed += self.eliminate_block(nested);
            }
        }

        if removed > 0 {
            block.recompute_root();
        }
        removed
    }

    /// Run all optimizations
    pub fn optimize(&self, program: &Program) -> Program {
        self.eliminate(program)
    }
}

fn is_empty_text(inst: &Instruction) -> bool {
    matches!(inst, Instruction::Text { value, .. } if value.is_empty())
}

impl Default for DeadCodeEliminator {
    fn default() -> Self {
        Self::new()
    }
}
