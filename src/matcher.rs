//! Path-match testing: the fast paths and regex fallback a single route
//! is tested with against a request path — the wildcard sentinel
//! shortcut, the literal shortcut for non-dynamic non-regex routes, the
//! literal-prefix pre-filter shared with the route index, and the
//! compiled-regex fallback that produces the parameter capture.

use crate::params::ParamMap;
use crate::percent::decode_param;
use crate::prefix;
use crate::route::Route;

/// Outcome of testing a route's *un-negated* pattern against a request
/// path. `matched` has negation already-applied by the caller (dispatch
/// XORs this against `route.is_negated`); this module only ever reports
/// whether the compiled pattern itself matched.
pub struct PathMatch {
    pub matched: bool,
    pub params: ParamMap,
}

fn no_match() -> PathMatch {
    PathMatch { matched: false, params: ParamMap::new() }
}

fn match_with_no_params() -> PathMatch {
    PathMatch { matched: true, params: ParamMap::new() }
}

pub fn match_route<S, A>(route: &Route<S, A>, uri: &str) -> PathMatch {
    // A wildcard route is neither a literal exact-match nor a bracket
    // placeholder, so it gets its own path: defer to the compiled regex
    // unconditionally. Without a namespace that regex is `^.*$` (matches
    // anything); with one it's `^/admin(/|$)`, so the boundary is still
    // enforced rather than treating the whole route as a blanket match.
    if route.is_wildcard {
        return match route.compiled_regex.is_match(uri) {
            true => match_with_no_params(),
            false => no_match(),
        };
    }

    if !route.is_dynamic && !route.is_custom_regex {
        let pattern = route.path.trim_start_matches('/');
        let candidate = uri.trim_start_matches('/');
        return if pattern == candidate { match_with_no_params() } else { no_match() };
    }

    let storage_uri = prefix::storage_path(uri);
    if !route.literal_prefix.is_empty() && !storage_uri.starts_with(route.literal_prefix.as_str()) {
        return no_match();
    }

    match route.compiled_regex.captures(uri) {
        Some(caps) => {
            let mut params = ParamMap::new();
            for (i, name) in route.compiled_regex.capture_names().enumerate().skip(1) {
                let Some(m) = caps.get(i) else { continue };
                match name {
                    Some(name) => params.set_named(name, decode_param(m.as_str())),
                    None => params.append_positional(i - 1, decode_param(m.as_str())),
                }
            }
            PathMatch { matched: true, params }
        }
        None => no_match(),
    }
}
