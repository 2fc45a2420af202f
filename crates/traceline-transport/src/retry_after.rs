//! Retry-After header parsing
//!
//! The `retry-after` header arrives either as a number of seconds or as an
//! RFC 7231 HTTP-date. Numeric form is tried first.

use tracing::debug;

/// Parse a `retry-after` header value into seconds from now.
///
/// Returns `None` if the value is in neither format.
pub fn parse_retry_after(header_value: &str) -> Option<u64> {
    if let Ok(seconds) = header_value.trim().parse::<u64>() {
        return Some(seconds);
    }

    if let Ok(target) = chrono::DateTime::parse_from_rfc2822(header_value) {
        let delta = target.signed_duration_since(chrono::Utc::now());
        // A past date means the retry window already opened
        return Some(delta.num_seconds().max(0) as u64);
    }

    debug!(header_value, "Failed to parse retry-after header");
    None
}
