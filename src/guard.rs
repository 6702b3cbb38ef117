//! A current logging scope guard.

use std::marker::PhantomData;

use crate::{LogContext, stack::SCOPE_STACK};

/// A guard representing a live context scope on the current thread.
///
/// When the guard is dropped, the scope is removed from the stack and its
/// fields are discarded. This is returned by the [`LogContext::enter`]
/// method.
///
/// # Examples
///
/// ```
/// use jsonline_logger::LogContext;
///
/// // Create a context with some data
/// let context = LogContext::new().record("user_id", 123);
///
/// // Enter the scope (pushes to stack)
/// let guard = context.enter();
///
/// // Records emitted here carry `user_id`
/// // ...
///
/// // When `guard` goes out of scope, the context is automatically removed
/// ```
#[non_exhaustive]
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    // Make this guard unsendable.
    _marker: PhantomData<&'a *mut ()>,
}

impl ScopeGuard<'_> {
    pub(crate) fn enter(context: LogContext) -> Self {
        SCOPE_STACK.with(|stack| stack.push(context.0));
        Self {
            _marker: PhantomData,
        }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        SCOPE_STACK.with(crate::stack::ScopeStack::pop);
    }
}
