//! Compiler error types

use dominator_core::ValueId;
use dominator_parser::ParseError;
use thiserror::Error;

/// Malformed instruction stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// Top-level fragment produces no node
    #[error("Template produces no root node")]
    EmptyTemplate,

    /// More than one unclaimed id in one instruction list
    #[error("Instruction list has {} roots ({}); exactly one is required", .roots.len(), join_ids(.roots))]
    MultipleRoots { roots: Vec<ValueId> },

    /// Id referenced before an instruction produced it
    #[error("{id} is referenced by {referenced_by} before it is defined")]
    ForwardReference { id: ValueId, referenced_by: String },

    /// Id defined twice
    #[error("{0} is defined more than once")]
    DuplicateId(ValueId),

    /// Id lower than one defined earlier in visitation order
    #[error("{id} is defined after {previous}")]
    OutOfOrderId { id: ValueId, previous: ValueId },

    /// Recorded block root disagrees with the unclaimed-id convention
    #[error("Recorded root {recorded:?} does not match unclaimed root {expected:?}")]
    RootMismatch {
        recorded: Option<ValueId>,
        expected: Option<ValueId>,
    },

    /// `onX` attribute without a handler
    #[error("Event attribute '{attribute}' needs a handler expression or name")]
    InvalidEventHandler { attribute: String },

    /// Procedure or component name that cannot be emitted as a JavaScript binding
    #[error("'{name}' is not a valid JavaScript identifier for {usage}")]
    InvalidIdentifier { name: String, usage: &'static str },
}

fn join_ids(ids: &[ValueId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compiler error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Tokenizer or parser failure
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// SSA lowering or IR validation failure
    #[error("Lowering error: {0}")]
    Lowering(#[from] LoweringError),
}

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_roots_display() {
        let err = LoweringError::MultipleRoots {
            roots: vec![ValueId(0), ValueId(2)],
        };
        assert_eq!(
            err.to_string(),
            "Instruction list has 2 roots (v0, v2); exactly one is required"
        );
    }

    #[test]
    fn test_compile_error_wraps_lowering() {
        let err: CompileError = LoweringError::EmptyTemplate.into();
        assert_eq!(err.to_string(), "Lowering error: Template produces no root node");
    }
}
