//! The external collaborators a handler sees: the inbound request, the
//! outbound response, and the dispatch context that bundles both together
//! with the user-supplied service/app values and the per-request
//! bookkeeping the dispatcher maintains (matched routes, matched methods).
//!
//! Request parsing and response transmission are out of scope here — this
//! module only specifies the shape those external collaborators present
//! to the router core.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use http::Method;

use crate::params::ParamMap;
use crate::route::Route;
use crate::router::Router;

/// An inbound request as seen by the router core. Everything except
/// `method`/`path` is a passthrough the core never inspects.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub headers: HashMap<String, String>,
    pub params: ParamMap,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Request {
            method,
            path: path.into(),
            query: String::new(),
            headers: HashMap::new(),
            params: ParamMap::new(),
        }
    }
}

/// The response under construction. `locked` mirrors the source's "response
/// already sent" state: once locked, appends are silent no-ops.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    locked: bool,
}

impl Default for Response {
    fn default() -> Self {
        Response { status: 200, body: String::new(), headers: HashMap::new(), locked: false }
    }
}

impl Response {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Appending to a locked response is a silent no-op; an empty string
    /// never touches the body either way.
    pub fn append_body(&mut self, text: &str) {
        if self.locked || text.is_empty() {
            return;
        }
        self.body.push_str(text);
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// The body is cleared, never the status or headers, before a HEAD
    /// response is sent.
    pub fn clear_body_for_head(&mut self) {
        self.body.clear();
    }
}

/// The set of HTTP methods that matched path-wise during one dispatch
/// pass. Union semantics, order-independent by design — backed by a small
/// `Vec` rather than a hash set since `http::Method`
/// has no blanket `Hash`/`Ord` impl and the cardinality is bounded by the
/// nine canonical methods anyway.
#[derive(Debug, Clone, Default)]
pub struct MatchedMethods(Vec<Method>);

impl MatchedMethods {
    pub fn new() -> Self {
        MatchedMethods(Vec::new())
    }

    pub fn insert(&mut self, method: Method) {
        if !self.0.contains(&method) {
            self.0.push(method);
        }
    }

    pub fn extend(&mut self, methods: impl IntoIterator<Item = Method>) {
        for m in methods {
            self.insert(m);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }

    /// `Allow: <comma-joined methods>`; order is unspecified by design.
    pub fn allow_header_value(&self) -> String {
        self.0.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// The routes that counted as a match during this dispatch pass, in the
/// order their handlers ran.
#[derive(Clone)]
pub struct MatchedRoutes<S, A>(Vec<Arc<Route<S, A>>>);

impl<S, A> Default for MatchedRoutes<S, A> {
    fn default() -> Self {
        MatchedRoutes(Vec::new())
    }
}

impl<S, A> MatchedRoutes<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: Arc<Route<S, A>>) {
        self.0.push(route);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route<S, A>>> {
        self.0.iter()
    }
}

/// Everything a handler is handed: the request/response pair the core
/// owns outright, the opaque `service`/`app` values the host application
/// supplies, the per-request bookkeeping (`matched`, `matched_methods`)
/// the dispatcher maintains, and a `Weak` back-reference to the `Router`
/// driving this dispatch. `Weak` rather than `Arc` — the router already
/// owns every route (and, transitively, the closures capturing handler
/// state); an owning reference here would make the per-request context
/// keep the whole router alive in a cycle with nothing to break it.
/// `Router::dispatch` populates it with `Arc::downgrade(self)` before the
/// first route is tried.
pub struct DispatchContext<S, A> {
    pub request: Request,
    pub response: Response,
    pub service: S,
    pub app: A,
    pub matched: MatchedRoutes<S, A>,
    pub matched_methods: MatchedMethods,
    pub router: Weak<Router<S, A>>,
}

impl<S, A> DispatchContext<S, A> {
    pub fn new(request: Request, service: S, app: A) -> Self {
        DispatchContext {
            request,
            response: Response::default(),
            service,
            app,
            matched: MatchedRoutes::new(),
            matched_methods: MatchedMethods::new(),
            router: Weak::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_response_ignores_appends() {
        let mut r = Response::default();
        r.append_body("first");
        r.lock();
        r.append_body("second");
        assert_eq!(r.body, "first");
    }

    #[test]
    fn empty_append_is_noop() {
        let mut r = Response::default();
        r.append_body("");
        assert_eq!(r.body, "");
    }

    #[test]
    fn matched_methods_dedupes_on_insert() {
        let mut m = MatchedMethods::new();
        m.insert(Method::GET);
        m.insert(Method::GET);
        m.insert(Method::POST);
        assert_eq!(m.iter().count(), 2);
    }
}
