//! Bounded rendering of log payloads
//!
//! Every string that ends up in a log line goes through [`truncate`] so that a
//! single oversized body cannot blow up a line. Cuts always land on a UTF-8
//! character boundary.

use serde::Serialize;

/// Placeholder written when a value cannot be rendered as JSON
pub const SERIALIZE_FAILED: &str = "Truncated and remove if has exception";

/// Placeholder written for absent fields
pub const EMPTY_FIELD: &str = "-";

/// Return the longest prefix of `s` whose UTF-8 length is at most `max_bytes`.
///
/// Never splits a multi-byte code point.
pub fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = 0;
    for (idx, ch) in s.char_indices() {
        let next = idx + ch.len_utf8();
        if next > max_bytes {
            break;
        }
        end = next;
    }
    &s[..end]
}

/// Owned variant of [`truncate`] for optional values.
pub fn truncate_opt(s: Option<&str>, max_bytes: usize) -> Option<String> {
    s.map(|s| truncate(s, max_bytes).to_string())
}

/// Serialize any value to a compact JSON string.
///
/// Failures never propagate: the fixed [`SERIALIZE_FAILED`] placeholder is
/// returned instead so the rest of the record can still be logged.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize log payload: {}", e);
            SERIALIZE_FAILED.to_string()
        }
    }
}

/// Serialize then truncate.
pub fn to_bounded_json<T: Serialize + ?Sized>(value: &T, max_bytes: usize) -> String {
    let json = to_json_string(value);
    truncate(&json, max_bytes).to_string()
}

/// Collapse a body for single-line logging (drops CR and LF).
pub fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
