//! Batched callbacks
//!
//! `batch` queues a callback; the first call while idle arms one flush through the
//! installed scheduler. The flush runs callbacks in FIFO order, including ones queued
//! during the flush, then disarms.

use super::scheduler::{self, Task};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

#[derive(Default)]
struct BatchQueue {
    queue: VecDeque<Task>,
    flush_pending: bool,
}

thread_local! {
    static BATCH: RefCell<BatchQueue> = RefCell::new(BatchQueue::default());
}

/// Defer `f` to the next flush
pub fn batch(f: impl FnOnce() + 'static) {
    let arm = BATCH.with(|batch| {
        let mut batch = batch.borrow_mut();
        batch.queue.push_back(Box::new(f));
        !std::mem::replace(&mut batch.flush_pending, true)
    });

    if arm {
        tracing::trace!("batch flush armed");
        scheduler::schedule(Box::new(flush));
    }
}

/// Whether a flush is armed and has not finished yet
pub fn is_flush_pending() -> bool {
    BATCH.with(|batch| batch.borrow().flush_pending)
}

fn flush() {
    let mut ran = 0usize;
    let mut first_panic = None;

    loop {
        let next = BATCH.with(|batch| batch.borrow_mut().queue.pop_front());
        let Some(task) = next else {
            break;
        };
        ran += 1;
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            first_panic.get_or_insert(payload);
        }
    }

    BATCH.with(|batch| batch.borrow_mut().flush_pending = false);
    tracing::debug!(callbacks = ran, "batch flushed");

    if let Some(payload) = first_panic {
        panic::resume_unwind(payload);
    }
}
