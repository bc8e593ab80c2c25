//! RFC 3986 percent-decoding for captured path parameters.
//!
//! `+` is left alone here — it is NOT folded to space the way form-encoded
//! bodies are decoded. `%2F` survives decoding to a literal `/` and is
//! delivered unchanged to the handler, same as any other decoded byte.

use percent_encoding::percent_decode_str;

/// Decode a single captured path parameter per RFC 3986.
///
/// Invalid UTF-8 produced by a decoded `%XX` sequence falls back to a
/// lossy conversion rather than failing the whole dispatch: a malformed
/// parameter value should not take down routing for an otherwise-valid
/// request.
pub fn decode_param(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
