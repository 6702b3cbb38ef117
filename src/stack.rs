use std::cell::RefCell;

use serde_json::{Map, Value};

thread_local! {
    pub(crate) static SCOPE_STACK: ScopeStack = const { ScopeStack::new() };
}

/// Per-thread stack of context scopes.
///
/// Each slot holds the scope's context value, usually a map. Non-map values
/// can end up here through [`replace`](ScopeStack::replace) and are handled
/// by the wrap-under-`data` policy on the next merge.
#[derive(Debug)]
pub(crate) struct ScopeStack {
    inner: RefCell<Vec<Value>>,
}

impl ScopeStack {
    pub(crate) const fn new() -> Self {
        ScopeStack {
            inner: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn push(&self, scope: Value) {
        self.inner.borrow_mut().push(scope);
    }

    pub(crate) fn pop(&self) -> Option<Value> {
        self.inner.borrow_mut().pop()
    }

    /// A clone of the innermost scope's value, or an empty map when no scope
    /// has been entered on this thread.
    pub(crate) fn snapshot(&self) -> Value {
        self.inner
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Merges `partial` into the innermost scope, keys in `partial` winning.
    ///
    /// If the innermost value is not a map it is discarded and the partial is
    /// stored under the reserved `data` key instead, so accumulation stays
    /// safe after a wholesale [`replace`](ScopeStack::replace).
    pub(crate) fn extend(&self, partial: Map<String, Value>) {
        let mut inner = self.inner.borrow_mut();
        match inner.last_mut() {
            Some(Value::Object(existing)) => {
                for (key, value) in partial {
                    existing.insert(key, value);
                }
            }
            Some(slot) => {
                let mut wrapped = Map::new();
                wrapped.insert("data".to_owned(), Value::Object(partial));
                *slot = Value::Object(wrapped);
            }
            None => inner.push(Value::Object(partial)),
        }
    }

    /// Replaces the innermost scope's value wholesale.
    pub(crate) fn replace(&self, value: Value) {
        let mut inner = self.inner.borrow_mut();
        match inner.last_mut() {
            Some(slot) => *slot = value,
            None => inner.push(value),
        }
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ScopeStack {
    pub(crate) fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}
