//! Pattern compilation: turns a route's raw path string into an anchored
//! regex plus enough metadata (dynamic/custom-regex/negated flags, ordered
//! placeholder pieces) for the index and dispatcher to operate on.

mod compiler;
mod lexer;
mod parser;
mod types;

pub use compiler::{compile, CompiledPattern};
pub use parser::Piece;
