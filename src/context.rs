use serde_json::{Map, Value};

use crate::{ContextValue, guard::ScopeGuard, stack::SCOPE_STACK};

/// A set of contextual fields bound to an execution scope.
///
/// A `LogContext` is built up with [`record`](LogContext::record) and then
/// [`enter`](LogContext::enter)ed, which makes its fields part of every
/// record emitted on the current thread until the returned guard is dropped.
/// The scope is typically one inbound request; the host environment decides
/// where it begins and ends.
///
/// While a scope is live its fields can be changed through the associated
/// functions: [`extend`](LogContext::extend) merges additional fields in,
/// [`replace`](LogContext::replace) swaps the whole value, and
/// [`current`](LogContext::current) takes a snapshot.
///
/// # Example
///
/// ```
/// use jsonline_logger::LogContext;
///
/// let _guard = LogContext::new()
///     .record("request_id", "req-123")
///     .record("user_id", 42)
///     .enter();
///
/// LogContext::add_record("step", "checkout");
/// let snapshot = LogContext::current();
/// assert_eq!(snapshot["request_id"], "req-123");
/// assert_eq!(snapshot["step"], "checkout");
/// ```
#[derive(Debug)]
pub struct LogContext(pub(crate) Value);

impl LogContext {
    #[must_use]
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Adds a field to this not-yet-entered context.
    #[must_use]
    pub fn record(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        if let Value::Object(fields) = &mut self.0 {
            fields.insert(key.into(), value.into().to_json());
        }
        self
    }

    /// Enters the scope, pushing this context onto the current thread's
    /// scope stack. Dropping the guard ends the scope and discards the
    /// accumulated fields.
    #[must_use]
    pub fn enter<'a>(self) -> ScopeGuard<'a> {
        ScopeGuard::enter(self)
    }

    /// A snapshot of the innermost live scope's value.
    ///
    /// Returns an empty map when no scope holds anything yet. Never fails.
    #[must_use]
    pub fn current() -> Value {
        SCOPE_STACK.with(crate::stack::ScopeStack::snapshot)
    }

    /// Merges the given fields into the innermost live scope.
    ///
    /// Keys in `entries` win over existing keys. If the scope currently
    /// holds a non-map value (after a [`replace`](LogContext::replace)),
    /// that value is dropped and the fields are stored under the reserved
    /// `data` key instead of failing.
    pub fn extend<I, K, V>(entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ContextValue>,
    {
        let partial: Map<String, Value> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into().to_json()))
            .collect();
        SCOPE_STACK.with(|stack| stack.extend(partial));
    }

    /// Merges a single field into the innermost live scope.
    pub fn add_record(key: impl Into<String>, value: impl Into<ContextValue>) {
        Self::extend([(key.into(), value.into())]);
    }

    /// Replaces the innermost live scope's value wholesale.
    pub fn replace(value: impl Into<ContextValue>) {
        SCOPE_STACK.with(|stack| stack.replace(value.into().to_json()));
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}
