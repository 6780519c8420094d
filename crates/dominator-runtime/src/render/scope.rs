//! Render scopes
//!
//! Names visible to template expressions. Each `each` row gets a child scope
//! binding the row item; lookups walk outwards through the parents.

use crate::dom::EventListener;
use crate::reactive::{Memo, Signal};
use dominator_core::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// What a name is bound to. Reactive bindings are read tracked.
#[derive(Clone)]
pub enum Binding {
    Value(Value),
    Signal(Signal<Value>),
    Memo(Memo<Value>),
}

impl Binding {
    pub fn get(&self) -> Value {
        match self {
            Binding::Value(value) => value.clone(),
            Binding::Signal(signal) => signal.get(),
            Binding::Memo(memo) => memo.get(),
        }
    }
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Binding::Value(value)
    }
}

impl From<Signal<Value>> for Binding {
    fn from(signal: Signal<Value>) -> Self {
        Binding::Signal(signal)
    }
}

impl From<Memo<Value>> for Binding {
    fn from(memo: Memo<Value>) -> Self {
        Binding::Memo(memo)
    }
}

#[derive(Clone, Default)]
struct ScopeInner {
    bindings: HashMap<String, Binding>,
    handlers: HashMap<String, EventListener>,
    parent: Option<Scope>,
}

/// Bindings plus named event handlers
#[derive(Clone, Default)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a value, signal or memo
    pub fn with(mut self, name: impl Into<String>, binding: impl Into<Binding>) -> Self {
        Rc::make_mut(&mut self.inner)
            .bindings
            .insert(name.into(), binding.into());
        self
    }

    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(name, Binding::Value(value.into()))
    }

    /// Register a handler reachable from `onX="name"` and `onX={name}`
    pub fn with_handler(mut self, name: impl Into<String>, handler: impl Fn(&Value) + 'static) -> Self {
        Rc::make_mut(&mut self.inner)
            .handlers
            .insert(name.into(), Rc::new(handler));
        self
    }

    /// Scope with one extra binding layered over this one
    pub fn child(&self, name: impl Into<String>, binding: impl Into<Binding>) -> Scope {
        let mut bindings = HashMap::new();
        bindings.insert(name.into(), binding.into());
        Scope {
            inner: Rc::new(ScopeInner {
                bindings,
                handlers: HashMap::new(),
                parent: Some(self.clone()),
            }),
        }
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        match self.inner.bindings.get(name) {
            Some(binding) => Some(binding),
            None => self.inner.parent.as_ref()?.binding(name),
        }
    }

    /// Current value of `name`; subscribes the running effect to reactive bindings
    pub fn get(&self, name: &str) -> Option<Value> {
        self.binding(name).map(Binding::get)
    }

    pub fn handler(&self, name: &str) -> Option<EventListener> {
        match self.inner.handlers.get(name) {
            Some(handler) => Some(handler.clone()),
            None => self.inner.parent.as_ref()?.handler(name),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.inner.bindings.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("bindings", &names)
            .field("handlers", &self.inner.handlers.len())
            .field("parent", &self.inner.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::signal;

    #[test]
    fn test_child_shadows_parent() {
        let root = Scope::new().with_value("a", 1).with_value("b", "x");
        let row = root.child("a", Value::from(2));

        assert_eq!(row.get("a"), Some(Value::Number(2.0)));
        assert_eq!(row.get("b"), Some(Value::String("x".to_string())));
        assert_eq!(root.get("a"), Some(Value::Number(1.0)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_signal_binding_reads_current_value() {
        let name = signal(Value::from("Ada"));
        let scope = Scope::new().with("name", name.clone());

        name.set(Value::from("Grace"));
        assert_eq!(scope.get("name"), Some(Value::from("Grace")));
    }

    #[test]
    fn test_handlers_are_inherited() {
        let scope = Scope::new().with_handler("save", |_| {});
        let row = scope.child("item", Value::Null);
        assert!(row.handler("save").is_some());
        assert!(row.handler("load").is_none());
    }
}
