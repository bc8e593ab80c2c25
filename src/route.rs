//! A single registered route: the immutable bundle of pattern artifacts,
//! method filter, handler, and bookkeeping flags the index and dispatcher
//! both consult.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::Method;

use crate::error::{InvalidArgument, RouteBuildError};
use crate::handler::Handler;
use crate::pattern::{self, Piece};
use crate::prefix;

/// The nine canonical HTTP methods this crate recognizes, matching the
/// set named explicitly in the route data model.
const CANONICAL_METHODS: &[&str] =
    &["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "TRACE", "CONNECT"];

pub fn parse_method(name: &str) -> Result<Method, InvalidArgument> {
    let upper = name.to_ascii_uppercase();
    if !CANONICAL_METHODS.contains(&upper.as_str()) {
        return Err(InvalidArgument::UnknownMethod(name.to_string()));
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| InvalidArgument::UnknownMethod(name.to_string()))
}

/// `HEAD` requests are also satisfied by routes registered for `GET`.
fn method_matches(request_method: &Method, candidate: &Method) -> bool {
    request_method == candidate || (*request_method == Method::HEAD && *candidate == Method::GET)
}

#[derive(Debug, Clone)]
pub enum MethodFilter {
    /// No constraint: every request method is treated as a match.
    Any,
    One(Method),
    Set(Vec<Method>),
}

impl MethodFilter {
    pub fn matches(&self, request_method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::One(m) => method_matches(request_method, m),
            MethodFilter::Set(set) => set.iter().any(|m| method_matches(request_method, m)),
        }
    }

    /// All methods this filter names, for `Allow`-header bookkeeping.
    /// Empty for `Any`, matching the "skipping null entries" rule for
    /// unioning into `matchedMethods`.
    pub fn names(&self) -> Vec<Method> {
        match self {
            MethodFilter::Any => Vec::new(),
            MethodFilter::One(m) => vec![m.clone()],
            MethodFilter::Set(set) => set.clone(),
        }
    }
}

fn next_hash() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

pub struct Route<S, A> {
    pub callback: Arc<dyn Handler<crate::context::DispatchContext<S, A>>>,
    pub original_path: String,
    pub path: String,
    pub method: MethodFilter,
    pub is_custom_regex: bool,
    pub is_negated: bool,
    pub is_negated_custom_regex: bool,
    pub is_dynamic: bool,
    /// Whether this route is the wildcard sentinel (`"*"`), possibly
    /// namespaced. The matcher uses this to always defer to the compiled
    /// regex rather than a literal fast path, since a namespaced wildcard
    /// is neither `is_dynamic` nor an exact literal.
    pub is_wildcard: bool,
    pub count_match: bool,
    pub compiled_regex: regex::Regex,
    pub pieces: Option<Vec<Piece>>,
    pub literal_prefix: String,
    pub name: Option<String>,
    pub hash: u64,
}

impl<S, A> Route<S, A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        namespace: &str,
        raw_path: &str,
        method: MethodFilter,
        callback: Arc<dyn Handler<crate::context::DispatchContext<S, A>>>,
        name: Option<String>,
    ) -> Result<Self, RouteBuildError> {
        let compiled = pattern::compile(namespace, raw_path)?;
        let count_match = raw_path != "*";
        let storage_path = prefix::storage_path(&compiled.normalized_path);
        let literal_prefix = prefix::literal_prefix(&storage_path);

        Ok(Route {
            callback,
            original_path: raw_path.to_string(),
            path: compiled.normalized_path,
            method,
            is_custom_regex: compiled.is_custom_regex,
            is_negated: compiled.is_negated,
            is_negated_custom_regex: compiled.is_custom_regex && compiled.is_negated,
            is_dynamic: compiled.is_dynamic,
            is_wildcard: compiled.is_wildcard,
            count_match,
            compiled_regex: compiled.regex,
            pieces: compiled.pieces,
            literal_prefix,
            name,
            hash: next_hash(),
        })
    }
}
