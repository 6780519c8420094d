//! Signals
//!
//! A signal owns one value and an insertion-ordered subscriber list. `set` with a
//! value equal to the current one is a no-op; otherwise every subscriber runs
//! synchronously, before `set` returns.
//!
//! A panicking subscriber does not cut the fan-out short: the remaining subscribers
//! still run and the first panic is resumed afterwards.

use super::effect::{current_observer, EffectInner};
use super::{next_id, Source, SubscriberId};
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

enum Subscriber<T> {
    Effect(Rc<EffectInner>),
    Callback(Rc<RefCell<dyn FnMut(&T)>>),
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        match self {
            Subscriber::Effect(effect) => Subscriber::Effect(effect.clone()),
            Subscriber::Callback(callback) => Subscriber::Callback(callback.clone()),
        }
    }
}

struct SignalInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(SubscriberId, Subscriber<T>)>>,
}

impl<T> SignalInner<T> {
    fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.borrow().iter().any(|(sid, _)| *sid == id)
    }
}

impl<T: Clone> SignalInner<T> {
    fn notify(&self) {
        let snapshot = self.subscribers.borrow().clone();
        tracing::trace!(subscribers = snapshot.len(), "signal changed");

        let mut first_panic = None;
        for (id, subscriber) in snapshot {
            // unsubscribed by an earlier subscriber of this same pass
            if !self.is_subscribed(id) {
                continue;
            }
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &subscriber {
                Subscriber::Effect(effect) => effect.run(),
                Subscriber::Callback(callback) => {
                    let value = self.value.borrow().clone();
                    if let Ok(mut callback) = callback.try_borrow_mut() {
                        (&mut *callback)(&value);
                    }
                }
            }));
            if let Err(payload) = outcome {
                first_panic.get_or_insert(payload);
            }
        }

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
    }
}

impl<T> Source for SignalInner<T> {
    fn remove_subscriber(&self, id: SubscriberId) {
        let removed = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers
                .iter()
                .position(|(sid, _)| *sid == id)
                .map(|index| subscribers.remove(index))
        };
        // dropped outside the borrow; may release the last handle to an effect
        drop(removed);
    }
}

/// Dependency-tracked state cell
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Current value; subscribes the running effect
    pub fn get(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value; subscribes the running effect.
    /// `f` must not write to this signal.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.borrow())
    }

    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store `value` and notify subscribers, unless it equals the current value
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value;
        }
        self.inner.notify();
    }

    /// Replace the value with `f(current)`
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with_untracked(f);
        self.set(next);
    }

    /// Call `f` with the new value after every change
    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) -> Subscription {
        let id = next_id();
        let callback: Rc<RefCell<dyn FnMut(&T)>> = Rc::new(RefCell::new(f));
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Subscriber::Callback(callback)));

        Subscription {
            id,
            source: Rc::downgrade(&self.inner) as Weak<dyn Source>,
        }
    }

    /// Effects and callbacks currently subscribed
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    fn track(&self) {
        let Some(observer) = current_observer() else {
            return;
        };

        {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            if !subscribers.iter().any(|(id, _)| *id == observer.id()) {
                subscribers.push((observer.id(), Subscriber::Effect(observer.clone())));
            }
        }
        // recorded on every run so the effect keeps this source
        observer.add_source(Rc::downgrade(&self.inner) as Weak<dyn Source>);
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

/// Create a signal holding `value`
pub fn signal<T: Clone + PartialEq + 'static>(value: T) -> Signal<T> {
    Signal::new(value)
}

/// Handle returned by [`Signal::subscribe`]
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    source: Weak<dyn Source>,
}

impl Subscription {
    /// Stop receiving values. A no-op once the signal is gone.
    pub fn unsubscribe(self) {
        if let Some(source) = self.source.upgrade() {
            source.remove_subscriber(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_set_equal_value_is_silent() {
        let s = signal(1);
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        let _sub = s.subscribe(move |_| counter.set(counter.get() + 1));

        s.set(1);
        assert_eq!(calls.get(), 0);
        s.set(2);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_update_passes_current_value() {
        let s = signal(2);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        let _sub = s.subscribe(move |v: &i32| log.borrow_mut().push(*v));

        s.update(|v| v + 1);
        assert_eq!(s.get_untracked(), 3);
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn test_unsubscribe() {
        let s = signal("a".to_string());
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        let sub = s.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(s.subscriber_count(), 1);

        sub.unsubscribe();
        s.set("b".to_string());
        assert_eq!(calls.get(), 0);
        assert_eq!(s.subscriber_count(), 0);
    }
}
