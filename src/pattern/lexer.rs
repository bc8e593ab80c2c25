//! Tokenizer for the placeholder-bracket grammar:
//! `[<type>:<name>]`, `[<type>]`, `[:<name>]`, followed by an optional `?`.
//!
//! A single delimiter pass over `:` and `]` is enough: bracket bodies are
//! either a known type token, an empty type, or an arbitrary sub-regex
//! string, so there's no nested-bracket or escape-hatch case to track.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawToken {
    /// A run of literal path text outside of any `[...]` block.
    Literal(String),
    /// Raw text captured inside a `[...]` block, up to the next `:` or `]`.
    Chunk(String),
    BracketOpen,
    BracketClose,
    Colon,
    /// A `?` immediately following a `BracketClose`.
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    UnterminatedBracket { at: usize },
    UnexpectedBracketClose { at: usize },
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::UnterminatedBracket { at } => write!(f, "unterminated '[' starting at index {}", at),
            LexError::UnexpectedBracketClose { at } => write!(f, "unmatched ']' at index {}", at),
        }
    }
}

/// Tokenize a placeholder pattern body (already stripped of namespace,
/// sentinel, and custom-regex/negation markers).
pub fn tokenize(input: &str) -> Result<Vec<RawToken>, LexError> {
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0usize;
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_bracket = false;
    let mut bracket_start = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if !in_bracket {
            match c {
                '[' => {
                    if !buf.is_empty() {
                        out.push(RawToken::Literal(std::mem::take(&mut buf)));
                    }
                    out.push(RawToken::BracketOpen);
                    in_bracket = true;
                    bracket_start = i;
                    i += 1;
                }
                ']' => {
                    return Err(LexError::UnexpectedBracketClose { at: i });
                }
                _ => {
                    buf.push(c);
                    i += 1;
                }
            }
            continue;
        }

        // Inside a bracket.
        match c {
            ':' => {
                out.push(RawToken::Chunk(std::mem::take(&mut buf)));
                out.push(RawToken::Colon);
                i += 1;
            }
            ']' => {
                out.push(RawToken::Chunk(std::mem::take(&mut buf)));
                out.push(RawToken::BracketClose);
                in_bracket = false;
                i += 1;
                if i < chars.len() && chars[i] == '?' {
                    out.push(RawToken::Optional);
                    i += 1;
                }
            }
            _ => {
                buf.push(c);
                i += 1;
            }
        }
    }

    if in_bracket {
        return Err(LexError::UnterminatedBracket { at: bracket_start });
    }
    if !buf.is_empty() {
        out.push(RawToken::Literal(buf));
    }

    Ok(out)
}
