//! Deferred task scheduling
//!
//! The batch queue arms its flush through a [`Scheduler`], the host's "run this
//! soon, on this thread" primitive. [`MicrotaskQueue`] is the default: a
//! thread-local queue drained by [`run_microtasks`] at the end of a cooperative tick.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Deferred unit of work
pub type Task = Box<dyn FnOnce() + 'static>;

/// Host deferred-task primitive
pub trait Scheduler {
    /// Run `task` later on the current thread
    fn schedule(&self, task: Task);
}

thread_local! {
    static SCHEDULER: RefCell<Rc<dyn Scheduler>> = RefCell::new(Rc::new(MicrotaskQueue) as Rc<dyn Scheduler>);
    static MICROTASKS: RefCell<VecDeque<Task>> = RefCell::new(VecDeque::new());
}

/// Install the scheduler used by this thread
pub fn set_scheduler(scheduler: impl Scheduler + 'static) {
    SCHEDULER.with(|current| *current.borrow_mut() = Rc::new(scheduler));
}

pub(crate) fn schedule(task: Task) {
    let scheduler = SCHEDULER.with(|current| current.borrow().clone());
    scheduler.schedule(task);
}

/// Thread-local cooperative tick queue
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrotaskQueue;

impl Scheduler for MicrotaskQueue {
    fn schedule(&self, task: Task) {
        MICROTASKS.with(|queue| queue.borrow_mut().push_back(task));
    }
}

/// Run queued microtasks until none are left, including ones queued meanwhile.
/// Returns how many ran.
pub fn run_microtasks() -> usize {
    let mut ran = 0;
    loop {
        let next = MICROTASKS.with(|queue| queue.borrow_mut().pop_front());
        let Some(task) = next else {
            break;
        };
        task();
        ran += 1;
    }
    ran
}

/// Microtasks waiting on this thread
pub fn pending_microtasks() -> usize {
    MICROTASKS.with(|queue| queue.borrow().len())
}

/// Spawns tasks on the current `tokio::task::LocalSet`
#[cfg(feature = "tokio")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn schedule(&self, task: Task) {
        tokio::task::spawn_local(async move { task() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_microtasks_queued_while_draining_run_too() {
        let hits = Rc::new(Cell::new(0));

        let outer = hits.clone();
        MicrotaskQueue.schedule(Box::new(move || {
            outer.set(outer.get() + 1);
            let inner = outer.clone();
            MicrotaskQueue.schedule(Box::new(move || inner.set(inner.get() + 10)));
        }));

        assert_eq!(pending_microtasks(), 1);
        assert_eq!(run_microtasks(), 2);
        assert_eq!(hits.get(), 11);
        assert_eq!(pending_microtasks(), 0);
    }
}
