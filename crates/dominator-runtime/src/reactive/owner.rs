//! Ownership scopes
//!
//! An owner collects the effects created while it is current, plus child owners and
//! cleanup callbacks. Disposing it tears the whole group down, depth first.

use super::effect::Effect;
use super::next_id;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    static OWNERS: RefCell<Vec<Option<Owner>>> = RefCell::new(Vec::new());
}

pub(crate) struct OwnerGuard;

impl OwnerGuard {
    pub(crate) fn push(owner: Option<Owner>) -> Self {
        OWNERS.with(|stack| stack.borrow_mut().push(owner));
        OwnerGuard
    }
}

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        let _ = OWNERS.try_with(|stack| stack.borrow_mut().pop());
    }
}

/// Owner new effects are registered with, if any
pub fn current_owner() -> Option<Owner> {
    OWNERS.with(|stack| stack.borrow().last().cloned().flatten())
}

/// Run `f` when the current owner is disposed or cleared.
/// Without a current owner `f` is dropped unrun.
pub fn on_cleanup(f: impl FnOnce() + 'static) {
    if let Some(owner) = current_owner() {
        owner.on_cleanup(f);
    }
}

pub(crate) fn register_effect(effect: &Effect) {
    if let Some(owner) = current_owner() {
        owner.register(effect);
    }
}

struct OwnerInner {
    id: u64,
    parent: Weak<OwnerInner>,
    effects: RefCell<Vec<Effect>>,
    children: RefCell<Vec<Owner>>,
    cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    disposed: Cell<bool>,
}

/// Disposal scope for effects
#[derive(Clone)]
pub struct Owner {
    inner: Rc<OwnerInner>,
}

impl Owner {
    /// Root owner with no parent
    pub fn new() -> Self {
        Self::with_parent(Weak::new())
    }

    fn with_parent(parent: Weak<OwnerInner>) -> Self {
        Self {
            inner: Rc::new(OwnerInner {
                id: next_id(),
                parent,
                effects: RefCell::new(Vec::new()),
                children: RefCell::new(Vec::new()),
                cleanups: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    /// New owner disposed together with this one
    pub fn child(&self) -> Owner {
        let child = Self::with_parent(Rc::downgrade(&self.inner));
        if self.is_disposed() {
            child.inner.disposed.set(true);
        } else {
            self.inner.children.borrow_mut().push(child.clone());
        }
        child
    }

    /// Run `f` with this owner current
    pub fn run_in<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = OwnerGuard::push(Some(self.clone()));
        f()
    }

    pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
        if self.is_disposed() {
            f();
        } else {
            self.inner.cleanups.borrow_mut().push(Box::new(f));
        }
    }

    pub(crate) fn register(&self, effect: &Effect) {
        if self.is_disposed() {
            effect.dispose();
        } else {
            self.inner.effects.borrow_mut().push(effect.clone());
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Live effects registered directly with this owner
    pub fn effect_count(&self) -> usize {
        self.inner
            .effects
            .borrow()
            .iter()
            .filter(|effect| !effect.is_disposed())
            .count()
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.borrow().len()
    }

    /// Dispose everything owned so far; the owner itself stays usable
    pub fn clear(&self) {
        let effects = std::mem::take(&mut *self.inner.effects.borrow_mut());
        let children = std::mem::take(&mut *self.inner.children.borrow_mut());
        let cleanups = std::mem::take(&mut *self.inner.cleanups.borrow_mut());

        for effect in effects {
            effect.dispose();
        }
        for child in children {
            child.dispose();
        }
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }

    /// Dispose everything owned and detach from the parent
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.clear();

        if let Some(parent) = self.inner.parent.upgrade() {
            let removed = {
                let mut siblings = parent.children.borrow_mut();
                siblings
                    .iter()
                    .position(|child| child.inner.id == self.inner.id)
                    .map(|index| siblings.remove(index))
            };
            drop(removed);
        }
        tracing::trace!(owner = self.inner.id, "owner disposed");
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.inner.id)
            .field("effects", &self.inner.effects.borrow().len())
            .field("children", &self.inner.children.borrow().len())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}
