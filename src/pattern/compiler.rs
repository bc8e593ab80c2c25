//! Ties the lexer, parser and type-alias table together into a single
//! compiled pattern: detect the leading sentinel/custom-regex/negation
//! markers, compose the namespace into the pattern body, and assemble the
//! final anchored regex.

use regex::Regex;

use crate::error::PatternCompilationError;
use crate::prefix;

use super::lexer::tokenize;
use super::parser::{tokens_to_pieces, Piece};
use super::types::resolve;

#[cfg(feature = "pattern-cache")]
use once_cell::sync::Lazy;
#[cfg(feature = "pattern-cache")]
use std::collections::HashMap;
#[cfg(feature = "pattern-cache")]
use std::hash::{Hash, Hasher};

/// The fully-resolved shape of a route's path pattern, ready to be stored
/// on a `Route` and consulted by the index and the dispatcher.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Namespace-prefixed, marker-stripped path text. This is what the
    /// literal-prefix rule and the route index both operate on.
    pub normalized_path: String,
    pub regex: Regex,
    pub is_custom_regex: bool,
    pub is_negated: bool,
    pub is_dynamic: bool,
    /// Whether this pattern was the wildcard sentinel (`"*"`), possibly
    /// namespaced. Distinct from `is_dynamic` (which is false for a
    /// wildcard, since it has no bracket placeholders) — matcher fast paths
    /// need to tell "matches literally anything (modulo namespace)" apart
    /// from "matches only this exact literal string".
    pub is_wildcard: bool,
    /// Ordered placeholder/literal breakdown, present only for patterns
    /// compiled from the bracket grammar (`None` for custom-regex and
    /// wildcard-sentinel patterns) — reverse routing needs this to
    /// reconstruct a concrete path from a parameter map.
    pub pieces: Option<Vec<Piece>>,
}

const WILDCARD_SENTINEL: &str = "*";

/// Compile a single route's raw path under the given namespace.
///
/// `raw_path` is exactly what the caller wrote when registering the route,
/// markers and all (e.g. `"!@^/admin/.*"`, `"*"`, `"/users/[i:id]"`).
pub fn compile(namespace: &str, raw_path: &str) -> Result<CompiledPattern, PatternCompilationError> {
    if raw_path.is_empty() {
        return Err(PatternCompilationError {
            namespace: namespace.to_string(),
            pattern: raw_path.to_string(),
            message: "pattern must not be empty".to_string(),
        });
    }

    let (is_negated, is_custom_regex, body) = strip_markers(raw_path);

    #[cfg(feature = "pattern-cache")]
    if let Some(hit) = cache_get(namespace, raw_path) {
        return Ok(hit);
    }

    let result = if !is_custom_regex && body == WILDCARD_SENTINEL {
        compile_wildcard(namespace)
    } else if is_custom_regex {
        compile_custom_regex(namespace, body)
    } else {
        compile_placeholder_body(namespace, body)
    };

    let mut compiled = result.map_err(|message| PatternCompilationError {
        namespace: namespace.to_string(),
        pattern: raw_path.to_string(),
        message,
    })?;
    compiled.is_custom_regex = is_custom_regex;
    compiled.is_negated = is_negated;

    // Construction-time validation probe: confirm the engine considers the
    // compiled regex usable against at least the empty string. `Regex::new`
    // above already rejects anything that doesn't parse, so this is mostly
    // a sanity check that matching itself doesn't panic.
    let _ = compiled.regex.is_match("");

    #[cfg(feature = "pattern-cache")]
    cache_put(namespace, raw_path, compiled.clone());

    Ok(compiled)
}

/// Split a raw path into `(is_negated, is_custom_regex, body)`. The body
/// has every leading marker character removed but is otherwise untouched.
fn strip_markers(raw_path: &str) -> (bool, bool, &str) {
    if let Some(rest) = raw_path.strip_prefix("!@") {
        (true, true, rest)
    } else if let Some(rest) = raw_path.strip_prefix('@') {
        (false, true, rest)
    } else if let Some(rest) = raw_path.strip_prefix('!') {
        (true, false, rest)
    } else {
        (false, false, raw_path)
    }
}

fn compile_wildcard(namespace: &str) -> Result<CompiledPattern, String> {
    let (regex_src, normalized_path) = if namespace.is_empty() {
        ("^.*$".to_string(), WILDCARD_SENTINEL.to_string())
    } else {
        (format!("^{}(/|$)", regex::escape(namespace)), format!("{}*", namespace))
    };
    let regex = Regex::new(&regex_src).map_err(|e| e.to_string())?;
    Ok(CompiledPattern {
        normalized_path,
        regex,
        is_custom_regex: false,
        is_negated: false,
        is_dynamic: false,
        is_wildcard: true,
        pieces: None,
    })
}

fn compile_custom_regex(namespace: &str, body: &str) -> Result<CompiledPattern, String> {
    let (regex_src, normalized_path) = if namespace.is_empty() {
        (body.to_string(), body.to_string())
    } else {
        let ns = regex::escape(namespace);
        let rest = match body.strip_prefix('^') {
            Some(tail) => tail.to_string(),
            None => format!(".*{}", body),
        };
        (format!("^{}{}", ns, rest), format!("{}{}", namespace, body))
    };
    let regex = Regex::new(&regex_src).map_err(|e| e.to_string())?;
    Ok(CompiledPattern {
        normalized_path,
        regex,
        is_custom_regex: true,
        is_negated: false,
        is_dynamic: false,
        is_wildcard: false,
        pieces: None,
    })
}

fn compile_placeholder_body(namespace: &str, body: &str) -> Result<CompiledPattern, String> {
    let combined = format!("{}{}", namespace, body);
    let tokens = tokenize(&combined).map_err(|e| e.to_string())?;
    let pieces = tokens_to_pieces(&tokens).map_err(|e| e.to_string())?;
    let regex_src = assemble_regex(&pieces);
    let regex = Regex::new(&regex_src).map_err(|e| e.to_string())?;
    let is_dynamic = pieces.iter().any(|p| matches!(p, Piece::Placeholder { .. }));
    Ok(CompiledPattern {
        normalized_path: combined,
        regex,
        is_custom_regex: false,
        is_negated: false,
        is_dynamic,
        is_wildcard: false,
        pieces: Some(pieces),
    })
}

/// Build the final anchored regex source from a piece sequence. Each
/// placeholder becomes a non-capturing group wrapping a (possibly named)
/// capturing group; the prefix character, if any, sits inside the outer
/// group but outside the capture so it isn't delivered as part of the
/// parameter value. A trailing `?` on the block makes the whole outer
/// group optional.
fn assemble_regex(pieces: &[Piece]) -> String {
    let mut out = String::from("^");
    for piece in pieces {
        match piece {
            Piece::Literal(s) => out.push_str(&regex::escape(s)),
            Piece::Placeholder { prefix, type_token, name, optional } => {
                let expansion = resolve(type_token);
                let mut inner = String::new();
                if let Some(c) = prefix {
                    inner.push_str(&regex::escape(&c.to_string()));
                }
                match name {
                    Some(n) => inner.push_str(&format!("(?P<{}>{})", n, expansion.as_str())),
                    None => inner.push_str(&format!("({})", expansion.as_str())),
                }
                out.push_str("(?:");
                out.push_str(&inner);
                out.push(')');
                if *optional {
                    out.push('?');
                }
            }
        }
    }
    out.push('$');
    out
}

#[cfg(feature = "pattern-cache")]
fn cache_key(namespace: &str, raw_path: &str) -> u64 {
    let mut hasher = fnv::FnvHasher::default();
    namespace.hash(&mut hasher);
    raw_path.hash(&mut hasher);
    hasher.finish()
}

#[cfg(feature = "pattern-cache")]
static PATTERN_CACHE: Lazy<crate::alias::PRwLock<HashMap<u64, CompiledPattern>>> =
    Lazy::new(|| crate::alias::PRwLock::new(HashMap::new()));

#[cfg(feature = "pattern-cache")]
fn cache_get(namespace: &str, raw_path: &str) -> Option<CompiledPattern> {
    let key = cache_key(namespace, raw_path);
    PATTERN_CACHE.read().get(&key).cloned()
}

#[cfg(feature = "pattern-cache")]
fn cache_put(namespace: &str, raw_path: &str, compiled: CompiledPattern) {
    let key = cache_key(namespace, raw_path);
    PATTERN_CACHE.write().insert(key, compiled);
}
