//! Placeholder type-alias table:
//!
//! | token | expansion |
//! |-------|-----------|
//! | `i`   | one or more decimal digits |
//! | `a`   | one or more ASCII alphanumerics |
//! | `h`   | one or more ASCII hex digits |
//! | `s`   | one or more of `[0-9A-Za-z_-]` |
//! | `*`   | lazy any-character (`.+?`) |
//! | `**`  | greedy any-character |
//! | (empty) | one or more non-slash characters, lazy |
//! | (anything else) | treated as a raw sub-regex |
//!
//! The `regex` crate has no possessive quantifier — its automaton is
//! linear-time and never backtracks pathologically, which is exactly what
//! a possessive quantifier exists to guarantee in a backtracking engine —
//! so `**` resolves to a plain greedy `.+` rather than `.++`. See DESIGN.md
//! for this decision.

/// Resolve a placeholder type token to the regex fragment it expands to.
/// Known aliases return a canned fragment; anything else is returned
/// unmodified, to be spliced into the compiled regex verbatim as a raw
/// sub-regex.
pub fn resolve(type_token: &str) -> TypeExpansion {
    match type_token {
        "i" => TypeExpansion::Fragment(r"[0-9]+"),
        "a" => TypeExpansion::Fragment(r"[0-9A-Za-z]+"),
        "h" => TypeExpansion::Fragment(r"[0-9A-Fa-f]+"),
        "s" => TypeExpansion::Fragment(r"[0-9A-Za-z_-]+"),
        "*" => TypeExpansion::Fragment(r".+?"),
        "**" => TypeExpansion::Fragment(r".+"),
        "" => TypeExpansion::Fragment(r"[^/]+?"),
        other => TypeExpansion::RawRegex(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpansion {
    /// A known alias; `&'static str` regex fragment.
    Fragment(&'static str),
    /// An unrecognized token, spliced in as-is.
    RawRegex(String),
}

impl TypeExpansion {
    pub fn as_str(&self) -> &str {
        match self {
            TypeExpansion::Fragment(s) => s,
            TypeExpansion::RawRegex(s) => s,
        }
    }
}
