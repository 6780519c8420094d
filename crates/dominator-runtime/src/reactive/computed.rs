//! Derived values

use super::effect::Effect;
use super::signal::{Signal, Subscription};
use std::fmt;

/// Read-only signal recomputed whenever its dependencies change
pub struct Memo<T> {
    signal: Signal<T>,
    effect: Effect,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
            effect: self.effect.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Memo<T> {
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }

    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }

    pub fn subscribe(&self, f: impl FnMut(&T) + 'static) -> Subscription {
        self.signal.subscribe(f)
    }

    /// Stop recomputing; the last value stays readable
    pub fn dispose(&self) {
        self.effect.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.effect.is_disposed()
    }
}

impl<T: fmt::Debug> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo").field("signal", &self.signal).finish()
    }
}

/// Derived value: `f` runs now and again after any signal it read changes.
/// Dependents are only notified when the result differs.
pub fn computed<T, F>(mut f: F) -> Memo<T>
where
    T: Clone + PartialEq + 'static,
    F: FnMut() -> T + 'static,
{
    let effect = Effect::detached(None);
    let initial = effect.inner().track(&mut f);
    let signal = Signal::new(initial);

    let target = signal.clone();
    effect.inner().set_fn(Box::new(move || target.set(f())));
    Memo { signal, effect }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::effect::effect;
    use crate::reactive::signal::signal;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_computed_follows_source() {
        let count = signal(2);
        let source = count.clone();
        let doubled = computed(move || source.get() * 2);

        assert_eq!(doubled.get(), 4);
        count.set(5);
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn test_unchanged_result_does_not_notify() {
        let n = signal(3);
        let source = n.clone();
        let parity = computed(move || source.get() % 2);

        let runs = Rc::new(Cell::new(0));
        let (counter, memo) = (runs.clone(), parity.clone());
        let _effect = effect(move || {
            memo.get();
            counter.set(counter.get() + 1);
        });

        n.set(5);
        assert_eq!(runs.get(), 1);
        n.set(6);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn test_disposed_memo_keeps_last_value() {
        let n = signal(1);
        let source = n.clone();
        let memo = computed(move || source.get() + 100);

        memo.dispose();
        n.set(2);
        assert_eq!(memo.get_untracked(), 101);
        assert!(memo.is_disposed());
    }
}
