use std::task::Poll;

use pin_project::pin_project;
use serde_json::Value;

use crate::{LogContext, stack::SCOPE_STACK};

/// Extension trait that binds a context scope to a future.
pub trait FutureExt: Future + Sized {
    /// Runs the future inside the given context scope.
    ///
    /// The scope is pushed before every poll and popped after it, so the
    /// future observes its own context regardless of which worker thread
    /// polls it, and sibling tasks never see each other's fields.
    fn in_scope(self, context: LogContext) -> ScopedFuture<Self>;
}

impl<F> FutureExt for F
where
    F: Future,
{
    fn in_scope(self, context: LogContext) -> ScopedFuture<Self> {
        ScopedFuture {
            inner: self,
            scope: Some(context.0),
        }
    }
}

#[pin_project]
#[derive(Debug)]
pub struct ScopedFuture<F> {
    #[pin]
    inner: F,
    scope: Option<Value>,
}

impl<F> Future for ScopedFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        SCOPE_STACK.with(|stack| stack.push(this.scope.take().unwrap()));
        let result = this.inner.poll(cx);
        this.scope
            .replace(SCOPE_STACK.with(|stack| stack.pop().unwrap()));

        result
    }
}
