//! Dominator Runtime - Reactive core and renderer
//!
//! This crate provides:
//! - Signals, effects, computed values and owners (`reactive`)
//! - Deferred batching over a pluggable scheduler
//! - A host document abstraction with an in-memory implementation (`dom`)
//! - A renderer that executes compiled instruction streams (`render`)

pub mod dom;
pub mod error;
pub mod reactive;
pub mod render;

pub use dom::{Document, EventListener, MemoryDocument, NodeId};
pub use error::{Result, RuntimeError};
pub use reactive::{
    batch, computed, current_owner, effect, on_cleanup, run_microtasks, set_scheduler, signal,
    untrack, Effect, Memo, Owner, Scheduler, Signal, Subscription,
};
pub use render::{Binding, Evaluator, PathEvaluator, Rendered, Renderer, Scope};
