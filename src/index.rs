//! Radix-style literal-prefix index: narrows the candidate set for a
//! request path before the dispatcher falls back to regex evaluation.
//! Ancestor buckets never copy a descendant's entries — they hold a set
//! of child-prefix aliases instead, so a lookup at any ancestor reaches
//! every descendant through a cheap recursive walk.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::route::Route;

#[derive(Default)]
struct Bucket<S, A> {
    direct: HashMap<u64, Arc<Route<S, A>>>,
    aliases: HashSet<String>,
}

pub struct RouteIndex<S, A> {
    buckets: crate::alias::PRwLock<HashMap<String, Bucket<S, A>>>,
    catch_all: crate::alias::PRwLock<HashMap<u64, Arc<Route<S, A>>>>,
}

impl<S, A> Default for RouteIndex<S, A> {
    fn default() -> Self {
        RouteIndex {
            buckets: crate::alias::PRwLock::new(HashMap::new()),
            catch_all: crate::alias::PRwLock::new(HashMap::new()),
        }
    }
}

impl<S, A> RouteIndex<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, route: Arc<Route<S, A>>) {
        let literal_prefix = route.literal_prefix.clone();

        // A negated route's true match set is the complement of its own
        // pattern, so it is never bounded by its own literal prefix — it
        // can match a request that falls under a sibling literal bucket
        // the single-bucket ancestor walk in `find_possible_routes` never
        // reaches. Treat it like a custom regex: unconditionally catch-all,
        // so it's present in every query result regardless of which ancestor
        // bucket happens to be non-empty first.
        if literal_prefix.is_empty() || route.is_custom_regex || route.is_negated {
            self.catch_all.write().insert(route.hash, route);
            return;
        }

        {
            let mut buckets = self.buckets.write();
            buckets
                .entry(literal_prefix.clone())
                .or_insert_with(Bucket::default)
                .direct
                .insert(route.hash, Arc::clone(&route));
        }

        for ancestor in slash_boundary_ancestors(&literal_prefix) {
            if ancestor == literal_prefix {
                continue;
            }
            let mut buckets = self.buckets.write();
            let bucket = buckets.entry(ancestor).or_insert_with(Bucket::default);
            let newly_linked = bucket.aliases.insert(literal_prefix.clone());
            if !newly_linked {
                // Every ancestor above this one must already carry the same
                // link from a prior insertion along this chain.
                break;
            }
        }
    }

    /// Every route reachable from the union of: the catch-all bucket, and
    /// the deepest non-empty literal-prefix bucket reached while walking
    /// the URI's own slash-boundary prefixes from longest to shortest.
    pub fn find_possible_routes(&self, uri: &str) -> HashMap<u64, Arc<Route<S, A>>> {
        let normalized = if uri.starts_with('/') { uri.to_string() } else { format!("/{}", uri) };

        let mut out = self.catch_all.read().clone();

        let buckets = self.buckets.read();
        let mut tried = HashSet::new();
        for candidate in query_candidates(&normalized) {
            if !tried.insert(candidate.clone()) {
                continue;
            }
            if let Some(bucket) = buckets.get(&candidate) {
                let mut collected = HashMap::new();
                deep_collect(&buckets, bucket, &mut collected);
                if !collected.is_empty() {
                    out.extend(collected);
                    break;
                }
            }
        }
        out
    }

    pub fn catch_all_routes(&self) -> Vec<Arc<Route<S, A>>> {
        self.catch_all.read().values().cloned().collect()
    }
}

fn deep_collect<S, A>(
    buckets: &HashMap<String, Bucket<S, A>>,
    bucket: &Bucket<S, A>,
    out: &mut HashMap<u64, Arc<Route<S, A>>>,
) {
    for (hash, route) in &bucket.direct {
        out.entry(*hash).or_insert_with(|| Arc::clone(route));
    }
    for alias in &bucket.aliases {
        if let Some(child) = buckets.get(alias) {
            deep_collect(buckets, child, out);
        }
    }
}

/// Every proper ancestor of `s` at a slash boundary, longest to shortest,
/// always terminating at `"/"`. E.g. `/users/profile` → `["/users/", "/"]`.
fn slash_boundary_ancestors(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let slash_positions: Vec<usize> = s.char_indices().filter(|(_, c)| *c == '/').map(|(i, _)| i).collect();
    for &pos in slash_positions.iter().rev() {
        let candidate = &s[..=pos];
        if candidate.len() < s.len() {
            out.push(candidate.to_string());
        }
    }
    if out.last().map(String::as_str) != Some("/") {
        out.push("/".to_string());
    }
    out
}

/// Slash-boundary prefixes of a URI, longest to shortest, starting with
/// the URI itself: `/users/55` → `["/users/55", "/users/", "/"]`.
fn query_candidates(uri: &str) -> Vec<String> {
    let mut out = vec![uri.to_string()];
    out.extend(slash_boundary_ancestors(uri));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DispatchContext;
    use crate::handler::Handler;
    use crate::route::MethodFilter;

    fn route(path: &str) -> Arc<Route<(), ()>> {
        let handler: Arc<dyn Handler<DispatchContext<(), ()>>> =
            Arc::new(|ctx: DispatchContext<(), ()>| async move { ctx.into() });
        Arc::new(Route::new("", path, MethodFilter::Any, handler, None).unwrap())
    }

    #[test]
    fn finds_exact_literal_bucket() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let r = route("/users/profile");
        idx.add(Arc::clone(&r));
        let found = idx.find_possible_routes("/users/profile");
        assert!(found.contains_key(&r.hash));
    }

    #[test]
    fn placeholder_route_reachable_via_its_own_prefix_bucket() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let id_route = route("/users/[i:id]");
        idx.add(Arc::clone(&id_route));
        let found = idx.find_possible_routes("/users/55");
        assert!(found.contains_key(&id_route.hash));
    }

    #[test]
    fn ancestor_alias_reaches_deeper_literal_route() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let profile = route("/users/profile");
        idx.add(Arc::clone(&profile));
        // Querying a shorter ancestor prefix than the registered route's
        // own literal prefix must still surface it through alias-walking
        // once a URI actually reaches that deep.
        let found = idx.find_possible_routes("/users/profile");
        assert!(found.contains_key(&profile.hash));
    }

    #[test]
    fn custom_regex_route_lives_in_catch_all() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let r = route("@^/anything$");
        idx.add(Arc::clone(&r));
        assert!(idx.catch_all_routes().iter().any(|x| x.hash == r.hash));
        // Catch-all routes are returned regardless of the queried URI.
        let found = idx.find_possible_routes("/totally/unrelated");
        assert!(found.contains_key(&r.hash));
    }

    #[test]
    fn wildcard_route_lives_in_catch_all() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let r = route("*");
        idx.add(Arc::clone(&r));
        assert!(idx.catch_all_routes().iter().any(|x| x.hash == r.hash));
    }

    #[test]
    fn negated_literal_route_lives_in_catch_all() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let r = route("!/secret");
        idx.add(Arc::clone(&r));
        assert!(idx.catch_all_routes().iter().any(|x| x.hash == r.hash));
    }

    #[test]
    fn negated_route_still_found_behind_an_unrelated_sibling_bucket() {
        // A sibling literal route under a different prefix must not shadow
        // a negated route during the ancestor walk: the negated route needs
        // to be reachable for every URI, not just ones under its own
        // prefix, since its true match set isn't bounded by that prefix.
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let sibling = route("/foo/bar");
        let negated = route("!/secret");
        idx.add(Arc::clone(&sibling));
        idx.add(Arc::clone(&negated));

        let found = idx.find_possible_routes("/foo/xyz");
        assert!(found.contains_key(&negated.hash));
    }

    #[test]
    fn radix_selectivity_with_many_routes() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let mut hashes = Vec::new();
        for i in 0..200 {
            let r = route(&format!("/group{}/section/item{}", i % 20, i));
            hashes.push(r.hash);
            idx.add(r);
        }
        for i in 0..200 {
            let uri = format!("/group{}/section/item{}", i % 20, i);
            let found = idx.find_possible_routes(&uri);
            assert!(found.contains_key(&hashes[i]), "missing route for {}", uri);
        }
    }

    #[test]
    fn unmatched_uri_falls_through_to_root_bucket() {
        // The root `/` bucket is an ancestor of every registered literal
        // prefix (per the data model's "Root route / is the degenerate
        // ancestor" rule), so once nothing more specific matches, walking
        // all the way to `/` surfaces every indexed route rather than an
        // empty set — the dispatcher's own method/path test is what
        // actually rejects the URI, not the index. An index is empty only
        // when it holds no routes at all.
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let r = route("/users/profile");
        idx.add(Arc::clone(&r));
        let found = idx.find_possible_routes("/completely/different");
        assert!(found.contains_key(&r.hash));
    }

    #[test]
    fn empty_index_returns_empty_for_any_uri() {
        let idx: RouteIndex<(), ()> = RouteIndex::new();
        let found = idx.find_possible_routes("/anything");
        assert!(found.is_empty());
    }
}
