//! The literal-prefix rule shared by the route index's bucketing and the
//! dispatcher's match pre-filter. Both call the exact same function here so
//! the two can never drift apart.

/// Characters that mark the start of a non-literal region in a pattern:
/// the placeholder opener, and the PCRE/regex metacharacters a hand-rolled
/// custom regex or an already-expanded placeholder body might begin with.
const META_STARTERS: &[char] = &['[', '(', '.', '?', '+', '*', '{', '}'];

/// Derive the storage path for a route: the wildcard sentinel is kept
/// as-is, everything else is forced to start with `/`.
pub fn storage_path(normalized_path: &str) -> String {
    if normalized_path == "*" {
        "*".to_string()
    } else if normalized_path.starts_with('/') {
        normalized_path.to_string()
    } else {
        format!("/{}", normalized_path)
    }
}

/// The longest prefix of `path` containing only characters safe to treat
/// literally: no regex metacharacter and no placeholder opener.
pub fn literal_prefix(path: &str) -> String {
    match path.find(META_STARTERS) {
        Some(idx) => path[..idx].to_string(),
        None => path.to_string(),
    }
}
