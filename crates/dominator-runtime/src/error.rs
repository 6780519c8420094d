//! Runtime error types

use dominator_core::{CoreError, ValueId};
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Expression names something the scope does not bind
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// Expression outside what the evaluator understands
    #[error("Cannot evaluate '{expression}': {message}")]
    Evaluation { expression: String, message: String },

    /// Event handler not registered on the scope
    #[error("Unknown event handler: {0}")]
    UnknownHandler(String),

    /// `onX` attribute without a handler
    #[error("Event '{0}' has no handler")]
    InvalidEventHandler(String),

    /// Component tag not registered with the renderer
    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    /// Instruction refers to a value no earlier instruction produced
    #[error("Missing value {0}")]
    MissingValue(ValueId),

    /// Anchor of an `each`/`if` block was removed from the tree
    #[error("Anchor of {0} is detached")]
    DetachedAnchor(ValueId),

    /// Value access failure
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
