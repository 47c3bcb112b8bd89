//! Response body decoding.
//!
//! Bodies are decoded in two tiers: a strict byte-level JSON parse, then a
//! lenient text-level retry that strips byte-order marks, NUL padding, and
//! surrounding whitespace, and tolerates invalid UTF-8 inside strings.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// The outcome of decoding a response body as `T`.
#[derive(Debug)]
pub(crate) enum DecodedBody<T> {
    /// The body parsed as JSON and fit `T`.
    Decoded(T),
    /// The body parsed as JSON but did not fit `T`.
    Mismatched(Value),
    /// No bytes, undecodable bytes, or JSON `null`. `text` is the lossy
    /// rendering of the raw body for diagnostics.
    Empty { text: String },
}

/// Decodes `raw` as `T`, distinguishing mismatched from empty bodies.
///
/// A body that decodes to JSON `null` counts as empty even when `T` could
/// absorb it; an absent value where one was expected is always a failure
/// upstream, never a silent default.
pub(crate) fn decode<T: DeserializeOwned>(raw: &[u8]) -> DecodedBody<T> {
    let Some(value) = parse_value(raw) else {
        return DecodedBody::Empty {
            text: String::from_utf8_lossy(raw).into_owned(),
        };
    };
    if value.is_null() {
        return DecodedBody::Empty {
            text: String::from_utf8_lossy(raw).into_owned(),
        };
    }
    match T::deserialize(&value) {
        Ok(decoded) => DecodedBody::Decoded(decoded),
        Err(_) => DecodedBody::Mismatched(value),
    }
}

fn parse_value(raw: &[u8]) -> Option<Value> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_slice(raw) {
        return Some(value);
    }
    let text = String::from_utf8_lossy(raw);
    let cleaned = text.trim_matches(|c: char| c == '\u{feff}' || c == '\0' || c.is_whitespace());
    if cleaned.is_empty() {
        return None;
    }
    serde_json::from_str(cleaned).ok()
}
