//! Structural validation of the instruction stream
//!
//! Checked for every block, nested ones included:
//! - ids are unique across the program and increase in visitation order
//! - every referenced id was produced earlier in the same or an enclosing block
//! - the recorded root equals the unique unclaimed id
//! - the top-level block has exactly one root

use crate::error::LoweringError;
use dominator_core::ir::{Block, Instruction, Program, ValueId};
use std::collections::HashSet;

/// IR validator
#[derive(Debug, Default)]
pub struct IrValidator {
    seen: HashSet<ValueId>,
    last: Option<ValueId>,
    scopes: Vec<HashSet<ValueId>>,
}

impl IrValidator {
    /// Validate a whole program
    pub fn validate(program: &Program) -> Result<(), LoweringError> {
        let mut validator = Self::default();
        validator.check_block(&program.block, true)?;
        tracing::trace!(ids = validator.seen.len(), "IR validated");
        Ok(())
    }

    fn check_block(&mut self, block: &Block, top_level: bool) -> Result<(), LoweringError> {
        self.scopes.push(HashSet::new());

        for inst in &block.instructions {
            if inst.defines_value() {
                self.define(inst.target())?;
            } else {
                self.require(inst.target(), inst)?;
            }

            if let Some(child) = inst.appended_child() {
                self.require(child, inst)?;
            }

            for nested in inst.nested_blocks() {
                self.check_block(nested, false)?;
            }
        }

        self.scopes.pop();
        check_root(block, top_level)
    }

    fn define(&mut self, id: ValueId) -> Result<(), LoweringError> {
        if !self.seen.insert(id) {
            return Err(LoweringError::DuplicateId(id));
        }
        if let Some(previous) = self.last {
            if id < previous {
                return Err(LoweringError::OutOfOrderId { id, previous });
            }
        }
        self.last = Some(id);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(id);
        }
        Ok(())
    }

    fn require(&self, id: ValueId, inst: &Instruction) -> Result<(), LoweringError> {
        if self.scopes.iter().any(|scope| scope.contains(&id)) {
            Ok(())
        } else {
            Err(LoweringError::ForwardReference {
                id,
                referenced_by: inst.to_string(),
            })
        }
    }
}

fn check_root(block: &Block, top_level: bool) -> Result<(), LoweringError> {
    let unclaimed = block.unclaimed_ids();
    let expected = match unclaimed.as_slice() {
        [] if top_level => return Err(LoweringError::EmptyTemplate),
        [] => None,
        [root] => Some(*root),
        _ => return Err(LoweringError::MultipleRoots { roots: unclaimed }),
    };

    if block.root != expected {
        return Err(LoweringError::RootMismatch {
            recorded: block.root,
            expected,
        });
    }
    Ok(())
}
