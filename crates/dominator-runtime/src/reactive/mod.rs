//! Reactive core
//!
//! Fine-grained, single-threaded reactivity: signals notify the effects that read
//! them, computed values are effects writing into an owned signal, owners dispose
//! groups of effects, and `batch` defers callbacks to the next scheduler tick.
//!
//! All state is thread-local. Values never cross threads.

pub mod batch;
pub mod computed;
pub mod effect;
pub mod owner;
pub mod scheduler;
pub mod signal;

pub use batch::{batch, is_flush_pending};
pub use computed::{computed, Memo};
pub use effect::{effect, untrack, Effect};
pub use owner::{current_owner, on_cleanup, Owner};
pub use scheduler::{pending_microtasks, run_microtasks, set_scheduler, MicrotaskQueue, Scheduler, Task};
pub use signal::{signal, Signal, Subscription};

#[cfg(feature = "tokio")]
pub use scheduler::TokioScheduler;

use std::cell::Cell;

/// Identity of an effect or callback in a signal's subscriber list
pub(crate) type SubscriberId = u64;

thread_local! {
    static NEXT_ID: Cell<u64> = Cell::new(0);
}

pub(crate) fn next_id() -> u64 {
    NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// Something an effect can be subscribed to
pub(crate) trait Source {
    fn remove_subscriber(&self, id: SubscriberId);
}
