//! The dispatcher: drives the match-execute loop over a `RouteCollection`
//! narrowed by a `RouteIndex`, plus the registration surface a caller uses
//! to build that table in the first place.
//!
//! `Router<S, A>` owns the whole request-routing table for one embedding
//! application. `S` and `A` are the opaque `service`/`app` context values
//! threaded through to every handler untouched by the core.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::Method;

use crate::alias::PRwLock;
use crate::collection::RouteCollection;
use crate::context::DispatchContext;
use crate::error::{
    DispatchError, DispatchSignal, HttpErrorCause, RouteBuildError, RouteNotFound, UnhandledError,
};
use crate::handler::Handler;
use crate::index::RouteIndex;
use crate::matcher::match_route;
use crate::pattern::Piece;
use crate::route::{MethodFilter, Route};

/// What a post-loop hook (an HTTP-error handler or an after-dispatch
/// callback) leaves behind: the context, possibly carrying on, or an
/// error that failed to be absorbed by the hook itself.
pub enum HookOutcome<S, A> {
    Continue(DispatchContext<S, A>),
    Failed(DispatchContext<S, A>, UnhandledError),
}

/// What an unknown-error handler leaves behind: either it considered the
/// error handled (dispatch returns the context as-is), or it passes the
/// same error on to the next handler in the chain.
pub enum UnknownErrorOutcome<S, A> {
    Handled(DispatchContext<S, A>),
    Unhandled(DispatchContext<S, A>, UnhandledError),
}

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// An HTTP-error handler sees the numeric status code, what triggered it,
/// and the dispatch context — but not an explicit `router` argument, since
/// the callback already runs as a method the `Router` itself drives; reach
/// it via `ctx.router` if the handler needs it. The trigger is narrowed to
/// the structured `HttpErrorCause` rather than an open-ended exception
/// value.
pub trait ErrorHandler<S, A>: Send + Sync + 'static {
    fn call(&self, code: u16, cause: HttpErrorCause, ctx: DispatchContext<S, A>) -> BoxFuture<HookOutcome<S, A>>;
}

impl<S, A, F, Fut> ErrorHandler<S, A> for F
where
    F: Fn(u16, HttpErrorCause, DispatchContext<S, A>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookOutcome<S, A>> + Send + 'static,
{
    fn call(&self, code: u16, cause: HttpErrorCause, ctx: DispatchContext<S, A>) -> BoxFuture<HookOutcome<S, A>> {
        Box::pin((self)(code, cause, ctx))
    }
}

/// A FIFO queue of callbacks invoked after the main dispatch loop, before
/// the response would be sent.
pub trait AfterDispatchHook<S, A>: Send + Sync + 'static {
    fn call(&self, ctx: DispatchContext<S, A>) -> BoxFuture<HookOutcome<S, A>>;
}

impl<S, A, F, Fut> AfterDispatchHook<S, A> for F
where
    F: Fn(DispatchContext<S, A>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HookOutcome<S, A>> + Send + 'static,
{
    fn call(&self, ctx: DispatchContext<S, A>) -> BoxFuture<HookOutcome<S, A>> {
        Box::pin((self)(ctx))
    }
}

/// The unknown-error path: handlers run in registration order until one
/// reports the error handled.
pub trait UnknownErrorHandler<S, A>: Send + Sync + 'static {
    fn call(&self, ctx: DispatchContext<S, A>, error: UnhandledError) -> BoxFuture<UnknownErrorOutcome<S, A>>;
}

impl<S, A, F, Fut> UnknownErrorHandler<S, A> for F
where
    F: Fn(DispatchContext<S, A>, UnhandledError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = UnknownErrorOutcome<S, A>> + Send + 'static,
{
    fn call(&self, ctx: DispatchContext<S, A>, error: UnhandledError) -> BoxFuture<UnknownErrorOutcome<S, A>> {
        Box::pin((self)(ctx, error))
    }
}

/// The whole routing table for one embedding application: the ordered
/// `RouteCollection`, the prefix `RouteIndex`, the current namespace scope
/// routes are registered under, and the three callback chains (HTTP-error,
/// unknown-error, after-dispatch). Built once at startup, then shared
/// read-only across every concurrent dispatch.
pub struct Router<S, A> {
    namespace: String,
    collection: RouteCollection<S, A>,
    index: RouteIndex<S, A>,
    http_error_handlers: PRwLock<Vec<Arc<dyn ErrorHandler<S, A>>>>,
    unknown_error_handlers: PRwLock<Vec<Arc<dyn UnknownErrorHandler<S, A>>>>,
    after_dispatch_hooks: PRwLock<Vec<Arc<dyn AfterDispatchHook<S, A>>>>,
}

impl<S, A> Default for Router<S, A> {
    fn default() -> Self {
        Router {
            namespace: String::new(),
            collection: RouteCollection::new(),
            index: RouteIndex::new(),
            http_error_handlers: PRwLock::new(Vec::new()),
            unknown_error_handlers: PRwLock::new(Vec::new()),
            after_dispatch_hooks: PRwLock::new(Vec::new()),
        }
    }
}

impl<S: Send + 'static, A: Send + 'static> Router<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- registration (RouteBuilder) -------------------------------------

    /// Raw registration, equivalent to constructing a `Route` by hand and
    /// adding it to both the collection and the index. Every convenience
    /// method below (`get`, `post`, `any`, ...) funnels through this.
    pub fn route<H>(&mut self, method: MethodFilter, path: &str, handler: H) -> Result<(), RouteBuildError>
    where
        H: Handler<DispatchContext<S, A>>,
    {
        self.route_named(method, path, handler, None)
    }

    pub fn named<H>(
        &mut self,
        method: MethodFilter,
        path: &str,
        handler: H,
        name: &str,
    ) -> Result<(), RouteBuildError>
    where
        H: Handler<DispatchContext<S, A>>,
    {
        self.route_named(method, path, handler, Some(name))
    }

    fn route_named<H>(
        &mut self,
        method: MethodFilter,
        path: &str,
        handler: H,
        name: Option<&str>,
    ) -> Result<(), RouteBuildError>
    where
        H: Handler<DispatchContext<S, A>>,
    {
        let route = Route::new(&self.namespace, path, method, Arc::new(handler), name.map(String::from))?;
        let route = Arc::new(route);
        tracing::debug!(path = %route.original_path, namespace = %self.namespace, "route registered");
        self.index.add(Arc::clone(&route));
        self.collection.push(route);
        Ok(())
    }

    pub fn get<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::GET), path, handler)
    }

    pub fn post<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::POST), path, handler)
    }

    pub fn put<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::PUT), path, handler)
    }

    pub fn delete<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::DELETE), path, handler)
    }

    pub fn patch<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::PATCH), path, handler)
    }

    pub fn options<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::OPTIONS), path, handler)
    }

    pub fn head<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::One(Method::HEAD), path, handler)
    }

    /// No method constraint: matches any request method.
    pub fn any<H: Handler<DispatchContext<S, A>>>(&mut self, path: &str, handler: H) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::Any, path, handler)
    }

    pub fn many<H: Handler<DispatchContext<S, A>>>(
        &mut self,
        methods: &[Method],
        path: &str,
        handler: H,
    ) -> Result<(), RouteBuildError> {
        self.route(MethodFilter::Set(methods.to_vec()), path, handler)
    }

    /// Scope a block of registrations under a namespace prefix, composed
    /// with whatever namespace is already active (so these nest). Restores
    /// the previous namespace once `f` returns, so sibling calls don't leak
    /// into one another.
    pub fn namespace<F>(&mut self, prefix: &str, f: F)
    where
        F: FnOnce(&mut Self),
    {
        let previous = std::mem::replace(&mut self.namespace, compose_namespace(&self.namespace, prefix));
        f(self);
        self.namespace = previous;
    }

    pub fn on_http_error<E: ErrorHandler<S, A>>(&self, handler: E) {
        self.http_error_handlers.write().push(Arc::new(handler));
    }

    pub fn on_unknown_error<E: UnknownErrorHandler<S, A>>(&self, handler: E) {
        self.unknown_error_handlers.write().push(Arc::new(handler));
    }

    pub fn after_dispatch<H: AfterDispatchHook<S, A>>(&self, hook: H) {
        self.after_dispatch_hooks.write().push(Arc::new(hook));
    }

    // ---- introspection ----------------------------------------------------

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Reverse routing: substitute `[...:paramName]` blocks
    /// in the named route's pattern with the supplied (already-encoded)
    /// values, preserving each block's literal prefix character. A missing
    /// optional block is erased entirely; a missing required block is left
    /// as literal placeholder syntax.
    pub fn path_for(
        &self,
        name: &str,
        params: &HashMap<String, String>,
        flatten_regex: bool,
    ) -> Result<String, RouteNotFound> {
        let route = self.collection.lookup_by_name(name).ok_or_else(|| RouteNotFound(name.to_string()))?;

        match &route.pieces {
            Some(pieces) => Ok(render_pieces(pieces, params)),
            None => {
                if route.is_custom_regex {
                    Ok(if flatten_regex { "/".to_string() } else { route.original_path.clone() })
                } else {
                    Ok(route.original_path.clone())
                }
            }
        }
    }

    /// Print the registered route table in registration order. Gated
    /// behind `dev-log` the same way the rest of this crate's internal
    /// flow tracing is — this is an operational-visibility aid, not part
    /// of the core's contract.
    #[cfg(feature = "dev-log")]
    pub fn dump_routes(&self) {
        for route in self.collection.iter() {
            crate::debug_log!("{:<7} {}", method_label(&route.method), route.original_path);
        }
    }

    // ---- dispatch -----------------------------------------------------

    /// Drive the match-execute loop for a single request, returning the
    /// context with its response populated. Errors only escape as `Err`
    /// when an unknown-error handler chain failed to absorb a failure
    /// raised by an HTTP-error handler or an after-dispatch hook;
    /// recognized HTTP errors (404/405) are absorbed internally and come
    /// back as `Ok` with the response code/Allow header already set.
    pub async fn dispatch(self: &Arc<Self>, mut ctx: DispatchContext<S, A>) -> Result<DispatchContext<S, A>, DispatchError> {
        ctx.router = Arc::downgrade(self);

        let request_method = ctx.request.method.clone();
        let candidates = self.index.find_possible_routes(&ctx.request.path);

        let mut skip_remaining: usize = 0;
        let mut abort_code: Option<u16> = None;

        for route in self.collection.iter() {
            if !candidates.contains_key(&route.hash) {
                continue;
            }

            if skip_remaining > 0 {
                skip_remaining -= 1;
                continue;
            }

            let method_ok = route.method.matches(&request_method);
            let path_test = match_route(route, &ctx.request.path);
            let effective_match = path_test.matched ^ route.is_negated;

            if effective_match && method_ok {
                for (name, value) in path_test.params.iter() {
                    match name.parse::<usize>() {
                        Ok(index) => ctx.request.params.append_positional(index, value.to_string()),
                        Err(_) => ctx.request.params.set_named(name, value.to_string()),
                    }
                }

                tracing::debug!(route = %route.original_path, "invoking handler");
                let body_checkpoint = ctx.response.body.len();
                let (new_ctx, signal) = Handler::call(route.callback.as_ref(), ctx).await.into_parts();
                ctx = new_ctx;

                if route.count_match {
                    ctx.matched.push(Arc::clone(route));
                }

                if let Some(signal) = signal {
                    match signal {
                        DispatchSignal::SkipThis => {
                            // "Abandon current route's contribution": undo
                            // whatever this handler appended to the body
                            // before moving on, unlike skipNext/skipRemaining
                            // which only change which routes run next.
                            ctx.response.body.truncate(body_checkpoint);
                            continue;
                        }
                        DispatchSignal::SkipNext(n) => skip_remaining = n,
                        DispatchSignal::SkipRemaining => break,
                        // A bare `abort()` (no code) is a generic dispatch
                        // halt: handled internally like `skipRemaining`,
                        // never surfaced as an HTTP error. Only `abort(code)`
                        // raises an actual HttpError.
                        DispatchSignal::Abort(None) => break,
                        DispatchSignal::Abort(Some(code)) => {
                            abort_code = Some(code);
                            break;
                        }
                    }
                }
            }

            if effective_match && route.count_match {
                ctx.matched_methods.extend(route.method.names());
            }
        }

        if let Some(code) = abort_code {
            tracing::warn!(code, "handler aborted dispatch with explicit code");
            return self.raise_http_error(code, HttpErrorCause::Aborted, ctx).await;
        }

        if ctx.matched.is_empty() && !ctx.matched_methods.is_empty() {
            ctx.response.set_header("Allow", ctx.matched_methods.allow_header_value());
            if request_method != Method::OPTIONS {
                tracing::warn!(path = %ctx.request.path, "405 method not allowed");
                return self.raise_http_error(405, HttpErrorCause::MethodNotAllowed, ctx).await;
            }
            return self.run_after_dispatch(ctx).await;
        }

        if ctx.matched.is_empty() {
            tracing::warn!(path = %ctx.request.path, "404 not found");
            return self.raise_http_error(404, HttpErrorCause::NotFound, ctx).await;
        }

        if request_method == Method::HEAD {
            ctx.response.clear_body_for_head();
        }

        self.run_after_dispatch(ctx).await
    }

    /// HTTP-error path: unlock the response for the handler chain's
    /// writing window, run every registered handler (not just the first),
    /// then lock it unconditionally — a recognized HTTP error always
    /// leaves the response in a sendable, final state regardless of what
    /// it was before the error fired.
    async fn raise_http_error(
        self: &Arc<Self>,
        code: u16,
        cause: HttpErrorCause,
        mut ctx: DispatchContext<S, A>,
    ) -> Result<DispatchContext<S, A>, DispatchError> {
        ctx.response.unlock();
        ctx.response.set_status(code);

        let handlers = self.http_error_handlers.read().clone();
        for handler in handlers.iter() {
            match handler.call(code, cause, ctx).await {
                HookOutcome::Continue(c) => ctx = c,
                HookOutcome::Failed(mut c, e) => {
                    tracing::error!(error = %e, "http error handler raised");
                    c.response.set_status(500);
                    c.response.body.clear();
                    c.response.lock();
                    return Err(DispatchError::Unhandled(e));
                }
            }
        }

        ctx.response.lock();
        Ok(ctx)
    }

    async fn run_after_dispatch(self: &Arc<Self>, mut ctx: DispatchContext<S, A>) -> Result<DispatchContext<S, A>, DispatchError> {
        let hooks = self.after_dispatch_hooks.read().clone();
        for hook in hooks.iter() {
            match hook.call(ctx).await {
                HookOutcome::Continue(c) => ctx = c,
                HookOutcome::Failed(c, e) => return self.raise_unknown_error(e, c).await,
            }
        }
        Ok(ctx)
    }

    /// Unknown-error path: handlers run in registration order until one
    /// reports the error handled; if none does (or none are
    /// registered), the response is set to 500 and the error is re-raised
    /// to the caller of `dispatch`.
    async fn raise_unknown_error(
        self: &Arc<Self>,
        error: UnhandledError,
        mut ctx: DispatchContext<S, A>,
    ) -> Result<DispatchContext<S, A>, DispatchError> {
        let handlers = self.unknown_error_handlers.read().clone();
        let mut error = error;
        for handler in handlers.iter() {
            match handler.call(ctx, error).await {
                UnknownErrorOutcome::Handled(c) => return Ok(c),
                UnknownErrorOutcome::Unhandled(c, e) => {
                    ctx = c;
                    error = e;
                }
            }
        }

        ctx.response.set_status(500);
        ctx.response.body.clear();
        ctx.response.lock();
        tracing::error!(error = %error, "unhandled error propagated to dispatch caller");
        Err(DispatchError::Unhandled(error))
    }
}

/// Compose a nested namespace: `("", "/api")` -> `"/api"`,
/// `("/api", "v1")` -> `"/api/v1"`, `("/api", "")` -> `"/api"`.
fn compose_namespace(base: &str, prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        format!("/{}", trimmed)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), trimmed)
    }
}

#[cfg(feature = "dev-log")]
fn method_label(filter: &MethodFilter) -> String {
    match filter {
        MethodFilter::Any => "ANY".to_string(),
        MethodFilter::One(m) => m.as_str().to_string(),
        MethodFilter::Set(set) => set.iter().map(|m| m.as_str()).collect::<Vec<_>>().join("|"),
    }
}

fn render_pieces(pieces: &[Piece], params: &HashMap<String, String>) -> String {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Literal(s) => out.push_str(s),
            Piece::Placeholder { prefix, type_token, name, optional } => {
                let value = name.as_ref().and_then(|n| params.get(n));
                match value {
                    Some(v) => {
                        if let Some(c) = prefix {
                            out.push(*c);
                        }
                        out.push_str(v);
                    }
                    None if *optional => {
                        // erase the whole block, prefix included
                    }
                    None => {
                        if let Some(c) = prefix {
                            out.push(*c);
                        }
                        out.push('[');
                        out.push_str(type_token);
                        if let Some(n) = name {
                            out.push(':');
                            out.push_str(n);
                        }
                        out.push(']');
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Request;
    use crate::handler::HandlerOutcome;

    fn req(method: Method, path: &str) -> Request {
        Request::new(method, path)
    }

    fn echo_handler(tag: &'static str) -> impl Handler<DispatchContext<(), ()>> {
        move |mut ctx: DispatchContext<(), ()>| async move {
            ctx.response.append_body(tag);
            HandlerOutcome::from(ctx)
        }
    }

    #[tokio::test]
    async fn typed_int_placeholder_matches_and_extracts() {
        let mut router: Router<(), ()> = Router::new();
        router.get("/[i:age]", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/987"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.request.params.get("age"), Some("987"));
        assert!(!result.matched.is_empty());
    }

    #[tokio::test]
    async fn unmatched_literal_type_is_404() {
        let mut router: Router<(), ()> = Router::new();
        router.get("/[i:age]", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/blue"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 404);
    }

    #[tokio::test]
    async fn head_falls_back_to_get_and_clears_body() {
        let mut router: Router<(), ()> = Router::new();
        router
            .get("/", |mut ctx: DispatchContext<(), ()>| async move {
                ctx.response.append_body("hello");
                HandlerOutcome::from(ctx)
            })
            .unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::HEAD, "/"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.body, "");
    }

    #[tokio::test]
    async fn namespace_prefixes_nested_routes() {
        let mut router: Router<(), ()> = Router::new();
        router.namespace("/u", |r| {
            r.get("/", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        });
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/u/"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 200);
    }

    #[tokio::test]
    async fn namespaced_wildcard_does_not_leak_outside_its_namespace() {
        let mut router: Router<(), ()> = Router::new();
        router.namespace("/admin", |r| {
            r.any("*", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        });
        let router = Arc::new(router);

        let inside = DispatchContext::new(req(Method::GET, "/admin/panel"), (), ());
        let result = router.dispatch(inside).await.unwrap();
        assert_eq!(result.response.status, 200);

        let outside = DispatchContext::new(req(Method::GET, "/other"), (), ());
        let result = router.dispatch(outside).await.unwrap();
        assert_eq!(result.response.status, 404);
    }

    #[tokio::test]
    async fn negated_route_matches_despite_an_unrelated_sibling_literal_bucket() {
        // Regression: a negated route must match any path but its own,
        // even when a sibling route under a different literal prefix is
        // the first non-empty ancestor bucket the index's ancestor walk
        // reaches for the queried URI.
        let mut router: Router<(), ()> = Router::new();
        router.get("/foo/bar", echo_handler("A")).unwrap();
        router.get("!/secret", echo_handler("B")).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/foo/xyz"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.body, "B");

        let ctx = DispatchContext::new(req(Method::GET, "/secret"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 404);
    }

    #[tokio::test]
    async fn method_mismatch_yields_405_with_allow_header() {
        let mut router: Router<(), ()> = Router::new();
        router.get("/", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        router.post("/", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::DELETE, "/"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 405);
        let allow = result.response.headers.get("Allow").unwrap();
        assert!(allow.contains("GET"));
        assert!(allow.contains("POST"));
    }

    #[tokio::test]
    async fn options_on_same_condition_does_not_405() {
        let mut router: Router<(), ()> = Router::new();
        router.get("/", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::OPTIONS, "/"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_ne!(result.response.status, 405);
        assert!(result.response.headers.get("Allow").unwrap().contains("GET"));
    }

    #[tokio::test]
    async fn percent_decoding_round_trips_through_dispatch() {
        let mut router: Router<(), ()> = Router::new();
        router.get("/[:test]", |ctx: DispatchContext<(), ()>| async move { ctx.into() }).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/and%2For"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.request.params.get("test"), Some("and/or"));

        let ctx2 = DispatchContext::new(req(Method::GET, "/Knife+Party"), (), ());
        let result2 = router.dispatch(ctx2).await.unwrap();
        assert_eq!(result2.request.params.get("test"), Some("Knife+Party"));
    }

    #[tokio::test]
    async fn flow_control_skip_this_skip_next_and_skip_remaining() {
        // Ten routes A..J on the same path, each echoing its own letter;
        // A skips itself, B skips the next 1, D skips the next 2, H skips
        // everything remaining. Expected output: "B, D, G, H".
        fn signal_handler(tag: &'static str, signal: Option<DispatchSignal>) -> impl Handler<DispatchContext<(), ()>> {
            move |mut ctx: DispatchContext<(), ()>| async move {
                if !ctx.response.body.is_empty() {
                    ctx.response.append_body(", ");
                }
                ctx.response.append_body(tag);
                match signal {
                    Some(s) => HandlerOutcome::Signal(ctx, s),
                    None => HandlerOutcome::from(ctx),
                }
            }
        }

        let mut router: Router<(), ()> = Router::new();
        router.get("/x", signal_handler("A", Some(DispatchSignal::SkipThis))).unwrap();
        router.get("/x", signal_handler("B", Some(DispatchSignal::SkipNext(1)))).unwrap();
        router.get("/x", signal_handler("C", None)).unwrap();
        router.get("/x", signal_handler("D", Some(DispatchSignal::SkipNext(2)))).unwrap();
        router.get("/x", signal_handler("E", None)).unwrap();
        router.get("/x", signal_handler("F", None)).unwrap();
        router.get("/x", signal_handler("G", None)).unwrap();
        router.get("/x", signal_handler("H", Some(DispatchSignal::SkipRemaining))).unwrap();
        router.get("/x", signal_handler("I", None)).unwrap();
        router.get("/x", signal_handler("J", None)).unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/x"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.body, "B, D, G, H");
    }

    #[test]
    fn reverse_routing_substitutes_named_params() {
        let mut router: Router<(), ()> = Router::new();
        router
            .named(
                MethodFilter::Any,
                "/dogs/[i:dog_id]/collars/[a:collar_slug]/?",
                |ctx: DispatchContext<(), ()>| async move { ctx.into() },
                "dog-collar-details",
            )
            .unwrap();

        let mut params = HashMap::new();
        params.insert("dog_id".to_string(), "idnumberandstuff".to_string());
        params.insert("collar_slug".to_string(), "d12f3d1f2d3".to_string());

        let path = router.path_for("dog-collar-details", &params, true).unwrap();
        assert_eq!(path, "/dogs/idnumberandstuff/collars/d12f3d1f2d3/?");
    }

    #[test]
    fn reverse_routing_missing_optional_param_erases_block() {
        let mut router: Router<(), ()> = Router::new();
        router
            .named(
                MethodFilter::Any,
                "/archive/[i:year]?",
                |ctx: DispatchContext<(), ()>| async move { ctx.into() },
                "archive",
            )
            .unwrap();

        let path = router.path_for("archive", &HashMap::new(), true).unwrap();
        assert_eq!(path, "/archive");
    }

    #[test]
    fn reverse_routing_unknown_name_errors() {
        let router: Router<(), ()> = Router::new();
        assert!(router.path_for("nope", &HashMap::new(), true).is_err());
    }

    #[tokio::test]
    async fn bare_abort_halts_without_raising_an_http_error() {
        // abort() with no code is a generic dispatch halt: the loop stops,
        // but nothing escalates to an HTTP error — unlike abort(code).
        let mut router: Router<(), ()> = Router::new();
        router
            .get("/x", |mut ctx: DispatchContext<(), ()>| async move {
                ctx.response.append_body("halted");
                HandlerOutcome::Signal(ctx, DispatchSignal::Abort(None))
            })
            .unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/x"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 200);
        assert_eq!(result.response.body, "halted");
    }

    #[tokio::test]
    async fn abort_with_code_raises_http_error() {
        let mut router: Router<(), ()> = Router::new();
        router
            .get("/x", |ctx: DispatchContext<(), ()>| async move {
                HandlerOutcome::Signal(ctx, DispatchSignal::Abort(Some(418)))
            })
            .unwrap();
        let router = Arc::new(router);

        let ctx = DispatchContext::new(req(Method::GET, "/x"), (), ());
        let result = router.dispatch(ctx).await.unwrap();
        assert_eq!(result.response.status, 418);
    }
}
