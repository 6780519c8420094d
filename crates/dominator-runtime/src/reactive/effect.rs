//! Effects and dependency tracking
//!
//! The running effect is the top of a thread-local observer stack, so an effect
//! created or run from inside another one restores the outer context on exit.
//! After every run the effect unsubscribes from the signals it no longer read;
//! signals read again keep the effect at its place in their subscriber order.

use super::owner::{self, Owner, OwnerGuard};
use super::{next_id, Source, SubscriberId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    static OBSERVERS: RefCell<Vec<Option<Rc<EffectInner>>>> = RefCell::new(Vec::new());
}

pub(crate) fn current_observer() -> Option<Rc<EffectInner>> {
    OBSERVERS.with(|stack| stack.borrow().last().cloned().flatten())
}

/// Pops the observer stack on drop, unwinding included
struct ObserverGuard;

impl ObserverGuard {
    fn push(observer: Option<Rc<EffectInner>>) -> Self {
        OBSERVERS.with(|stack| stack.borrow_mut().push(observer));
        ObserverGuard
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        let _ = OBSERVERS.try_with(|stack| stack.borrow_mut().pop());
    }
}

struct RunningGuard<'a>(&'a Cell<bool>);

impl<'a> RunningGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        RunningGuard(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Unsubscribes from the sources of the previous run that were not read again.
/// Declared before the other guards so it drops last.
struct StaleSources<'a> {
    effect: &'a EffectInner,
    previous: Vec<Weak<dyn Source>>,
}

impl Drop for StaleSources<'_> {
    fn drop(&mut self) {
        let Ok(current) = self.effect.sources.try_borrow() else {
            return;
        };
        let stale: Vec<_> = self
            .previous
            .drain(..)
            .filter(|source| !current.iter().any(|read| Weak::ptr_eq(read, source)))
            .collect();
        drop(current);

        for source in stale {
            if let Some(source) = source.upgrade() {
                source.remove_subscriber(self.effect.id);
            }
        }
    }
}

pub(crate) struct EffectInner {
    id: SubscriberId,
    f: RefCell<Option<Box<dyn FnMut()>>>,
    sources: RefCell<Vec<Weak<dyn Source>>>,
    running: Cell<bool>,
    disposed: Cell<bool>,
    /// Effects and owners created while this effect runs; cleared before each re-run
    children: Owner,
}

impl EffectInner {
    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn add_source(&self, source: Weak<dyn Source>) {
        let mut sources = self.sources.borrow_mut();
        if !sources.iter().any(|known| Weak::ptr_eq(known, &source)) {
            sources.push(source);
        }
    }

    pub(crate) fn set_fn(&self, f: Box<dyn FnMut()>) {
        *self.f.borrow_mut() = Some(f);
    }

    fn clear_sources(&self) {
        let sources = std::mem::take(&mut *self.sources.borrow_mut());
        for source in sources {
            if let Some(source) = source.upgrade() {
                source.remove_subscriber(self.id);
            }
        }
    }

    /// Re-run the body. A no-op while the effect is already running or disposed.
    pub(crate) fn run(self: &Rc<Self>) {
        if self.disposed.get() || self.running.get() {
            return;
        }

        self.children.clear();
        self.track(|| {
            if let Ok(mut f) = self.f.try_borrow_mut() {
                if let Some(f) = f.as_mut() {
                    f();
                }
            }
        });

        // disposed by its own body
        if self.disposed.get() {
            self.clear_sources();
            if let Ok(mut f) = self.f.try_borrow_mut() {
                *f = None;
            }
        }
    }

    /// Run `f` with this effect collecting dependencies
    pub(crate) fn track<R>(self: &Rc<Self>, f: impl FnOnce() -> R) -> R {
        let _stale = StaleSources {
            effect: &**self,
            previous: std::mem::take(&mut *self.sources.borrow_mut()),
        };
        let _running = RunningGuard::enter(&self.running);
        let _observer = ObserverGuard::push(Some(self.clone()));
        let _owner = OwnerGuard::push(Some(self.children.clone()));
        f()
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.clear_sources();
        self.children.dispose();
        if let Ok(mut f) = self.f.try_borrow_mut() {
            *f = None;
        }
        tracing::trace!(effect = self.id, "effect disposed");
    }
}

/// Handle to a running effect
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl Effect {
    /// Effect that is registered with the current owner but has not run yet
    pub(crate) fn detached(f: Option<Box<dyn FnMut()>>) -> Self {
        let effect = Self {
            inner: Rc::new(EffectInner {
                id: next_id(),
                f: RefCell::new(f),
                sources: RefCell::new(Vec::new()),
                running: Cell::new(false),
                disposed: Cell::new(false),
                children: Owner::new(),
            }),
        };
        owner::register_effect(&effect);
        effect
    }

    pub(crate) fn inner(&self) -> &Rc<EffectInner> {
        &self.inner
    }

    /// Unsubscribe from every source and stop re-running
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of signals read during the latest run
    pub fn dependency_count(&self) -> usize {
        self.inner
            .sources
            .borrow()
            .iter()
            .filter(|source| source.strong_count() > 0)
            .count()
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

/// Run `f` now and again whenever a signal it read changes
pub fn effect(f: impl FnMut() + 'static) -> Effect {
    let effect = Effect::detached(Some(Box::new(f)));
    tracing::trace!(effect = effect.inner.id, "effect created");
    effect.inner.run();
    effect
}

/// Run `f` without subscribing the current effect to anything it reads
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _observer = ObserverGuard::push(None);
    f()
}
