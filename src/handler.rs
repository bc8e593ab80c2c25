//! The handler trait invoked by the dispatcher for each route whose
//! pattern test passes.
//!
//! A handler consumes the dispatch context by value and returns it inside
//! a boxed future, exactly like an owned-context "final handler" pattern —
//! except the context always comes back, even when the handler raises a
//! flow-control signal, since the dispatch loop needs it to keep going.

use std::future::Future;
use std::pin::Pin;

use crate::error::DispatchSignal;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// What a handler invocation leaves behind: the (possibly modified)
/// context, and — if the handler raised one — a flow-control signal for
/// the dispatch loop to act on.
pub enum HandlerOutcome<C> {
    Continue(C),
    Signal(C, DispatchSignal),
}

impl<C> HandlerOutcome<C> {
    pub fn into_parts(self) -> (C, Option<DispatchSignal>) {
        match self {
            HandlerOutcome::Continue(ctx) => (ctx, None),
            HandlerOutcome::Signal(ctx, signal) => (ctx, Some(signal)),
        }
    }
}

impl<C> From<C> for HandlerOutcome<C> {
    fn from(ctx: C) -> Self {
        HandlerOutcome::Continue(ctx)
    }
}

pub trait Handler<C>: Send + Sync + 'static {
    fn call(&self, ctx: C) -> BoxFuture<HandlerOutcome<C>>;
}

/// Blanket impl: any `Fn(C) -> impl Future<Output = HandlerOutcome<C>>` is
/// usable directly as a route handler, closures included.
impl<F, Fut, C> Handler<C> for F
where
    F: Fn(C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerOutcome<C>> + Send + 'static,
{
    fn call(&self, ctx: C) -> BoxFuture<HandlerOutcome<C>> {
        Box::pin((self)(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Ctx(u32);

    #[tokio::test]
    async fn closure_handler_runs_to_completion() {
        let handler = |ctx: Ctx| async move { HandlerOutcome::from(Ctx(ctx.0 + 1)) };
        let (ctx, signal) = Handler::call(&handler, Ctx(41)).await.into_parts();
        assert_eq!(ctx, Ctx(42));
        assert!(signal.is_none());
    }

    #[tokio::test]
    async fn closure_handler_can_signal_skip_and_still_returns_context() {
        let handler = |ctx: Ctx| async move { HandlerOutcome::Signal(ctx, DispatchSignal::SkipThis) };
        let (ctx, signal) = Handler::call(&handler, Ctx(7)).await.into_parts();
        assert_eq!(ctx, Ctx(7));
        assert_eq!(signal, Some(DispatchSignal::SkipThis));
    }
}
