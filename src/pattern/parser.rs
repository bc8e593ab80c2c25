//! Turns a bracket-tokenized pattern body into a sequence of literal and
//! placeholder pieces: each placeholder block captures its optional
//! literal prefix character (`/` or `.`), its type token, its optional
//! name, and whether the whole block is marked `?` (optional).

use super::lexer::RawToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Literal(String),
    Placeholder {
        /// The `/` or `.` immediately preceding this block in the original
        /// text, pulled out of the literal run so it can be wrapped inside
        /// the placeholder's (optional) non-capturing group.
        prefix: Option<char>,
        type_token: String,
        name: Option<String>,
        optional: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    MalformedPlaceholder { at_token: usize },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MalformedPlaceholder { at_token } => {
                write!(f, "malformed placeholder at token index {}", at_token)
            }
        }
    }
}

pub fn tokens_to_pieces(tokens: &[RawToken]) -> Result<Vec<Piece>, ParseError> {
    let mut pieces = Vec::new();
    let mut i = 0usize;

    while i < tokens.len() {
        match &tokens[i] {
            RawToken::Literal(s) => {
                pieces.push(Piece::Literal(s.clone()));
                i += 1;
            }
            RawToken::BracketOpen => {
                // Pull a trailing '/' or '.' off the previous literal piece,
                // if any, to use as this placeholder's prefix character.
                let prefix = match pieces.last_mut() {
                    Some(Piece::Literal(lit)) if lit.ends_with('/') || lit.ends_with('.') => {
                        let c = lit.pop().unwrap();
                        if lit.is_empty() {
                            pieces.pop();
                        }
                        Some(c)
                    }
                    _ => None,
                };

                let (type_token, name, next) = parse_block_body(tokens, i + 1)?;
                i = next;

                let optional = if matches!(tokens.get(i), Some(RawToken::Optional)) {
                    i += 1;
                    true
                } else {
                    false
                };

                pieces.push(Piece::Placeholder { prefix, type_token, name, optional });
            }
            _ => return Err(ParseError::MalformedPlaceholder { at_token: i }),
        }
    }

    Ok(pieces)
}

/// Parse the contents of a `[...]` block starting right after `BracketOpen`
/// at index `start`. Returns `(type_token, name, index_after_BracketClose)`.
fn parse_block_body(tokens: &[RawToken], start: usize) -> Result<(String, Option<String>, usize), ParseError> {
    let mut i = start;
    let first = match tokens.get(i) {
        Some(RawToken::Chunk(s)) => s.clone(),
        _ => return Err(ParseError::MalformedPlaceholder { at_token: i }),
    };
    i += 1;

    match tokens.get(i) {
        Some(RawToken::Colon) => {
            i += 1;
            let name = match tokens.get(i) {
                Some(RawToken::Chunk(s)) => s.clone(),
                _ => return Err(ParseError::MalformedPlaceholder { at_token: i }),
            };
            i += 1;
            match tokens.get(i) {
                Some(RawToken::BracketClose) => {
                    i += 1;
                    let name = if name.is_empty() { None } else { Some(name) };
                    Ok((first, name, i))
                }
                _ => Err(ParseError::MalformedPlaceholder { at_token: i }),
            }
        }
        Some(RawToken::BracketClose) => {
            i += 1;
            Ok((first, None, i))
        }
        _ => Err(ParseError::MalformedPlaceholder { at_token: i }),
    }
}
