//! Ordered, named collection of every route registered on a router.
//! Iteration always yields registration order — the index only narrows
//! candidates, it never reorders them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::route::Route;

pub struct RouteCollection<S, A> {
    routes: Vec<Arc<Route<S, A>>>,
    named: crate::alias::PRwLock<HashMap<String, Arc<Route<S, A>>>>,
    prepared: AtomicBool,
}

impl<S, A> Default for RouteCollection<S, A> {
    fn default() -> Self {
        RouteCollection {
            routes: Vec::new(),
            named: crate::alias::PRwLock::new(HashMap::new()),
            prepared: AtomicBool::new(false),
        }
    }
}

impl<S, A> RouteCollection<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route, preserving registration order. Invalidates the
    /// "prepared" flag: a subsequent name lookup re-scans.
    pub fn push(&mut self, route: Arc<Route<S, A>>) {
        self.routes.push(route);
        self.prepared.store(false, Ordering::Relaxed);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route<S, A>>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// One-shot pass that re-keys every named route into the name index,
    /// without touching registration order. Cheap to call repeatedly:
    /// a no-op once already prepared and un-mutated since.
    pub fn prepare_named(&self) {
        if self.prepared.load(Ordering::Relaxed) {
            return;
        }
        let mut named = self.named.write();
        named.clear();
        for route in &self.routes {
            if let Some(name) = &route.name {
                named.insert(name.clone(), Arc::clone(route));
            }
        }
        self.prepared.store(true, Ordering::Relaxed);
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<Route<S, A>>> {
        self.prepare_named();
        self.named.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DispatchContext;
    use crate::handler::Handler;
    use crate::route::MethodFilter;

    fn route(path: &str, name: Option<&str>) -> Arc<Route<(), ()>> {
        let handler: Arc<dyn Handler<DispatchContext<(), ()>>> =
            Arc::new(|ctx: DispatchContext<(), ()>| async move { ctx.into() });
        Arc::new(Route::new("", path, MethodFilter::Any, handler, name.map(String::from)).unwrap())
    }

    #[test]
    fn iteration_preserves_registration_order() {
        let mut c: RouteCollection<(), ()> = RouteCollection::new();
        c.push(route("/a", None));
        c.push(route("/b", None));
        c.push(route("/c", None));
        let paths: Vec<_> = c.iter().map(|r| r.original_path.clone()).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn lookup_by_name_after_prepare() {
        let mut c: RouteCollection<(), ()> = RouteCollection::new();
        c.push(route("/dogs/[i:id]", Some("dog-details")));
        let found = c.lookup_by_name("dog-details").unwrap();
        assert_eq!(found.original_path, "/dogs/[i:id]");
        assert!(c.lookup_by_name("missing").is_none());
    }

    #[test]
    fn pushing_after_prepare_still_finds_new_names() {
        let mut c: RouteCollection<(), ()> = RouteCollection::new();
        c.push(route("/a", Some("a")));
        assert!(c.lookup_by_name("a").is_some());
        c.push(route("/b", Some("b")));
        assert!(c.lookup_by_name("b").is_some());
    }
}
