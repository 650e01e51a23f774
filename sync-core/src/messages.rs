//! User-facing failure messages.
//!
//! Network and parse failures never escape the containers; they reach the
//! UI only as one of these strings.

use twablet_sync_types::ApiErrorEnvelope;

/// The API answered with its rate-limit envelope.
pub const RATE_LIMIT_EXCEEDED: &str = "Twitter rate limit exceeded. Please try again later.";

/// Any other transport or HTTP failure.
pub const NETWORK_ERROR: &str = "Network error. Please try again later.";

/// The reply could not be parsed.
pub const INTERNAL_ERROR: &str = "Internal error";

/// HTTP 403 on a status update.
pub const DUPLICATE_STATUS: &str = "Sending the same tweet twice is not allowed.";

/// HTTP 403 on a retweet.
pub const RETWEET_NOT_ALLOWED: &str = "Retweeting is not allowed.";

/// HTTP 403 on a favorite.
pub const FAVORITE_NOT_ALLOWED: &str = "Favoriting is not allowed.";

/// HTTP 404 on an unfavorite.
pub const NOT_IN_FAVORITES: &str = "This tweet is not in your favorites";

/// Message for a failed request whose error body was `body`.
pub fn for_error_body(body: &[u8]) -> &'static str {
    match ApiErrorEnvelope::parse(body) {
        Some(envelope) if envelope.is_rate_limit() => RATE_LIMIT_EXCEEDED,
        _ => NETWORK_ERROR,
    }
}
