//! Caller identification from request headers.

use axum::http::HeaderMap;

/// Identifier used when no client address header is present, e.g. when the
/// service runs locally without a proxy in front of it.
pub const FALLBACK_IDENTIFIER: &str = "dev-user";

/// Derive the rate limit identifier for a request.
///
/// Headers are consulted in trust order: the edge network's client-IP header
/// first, then the generic forwarded-for chain (first hop), then the reverse
/// proxy's real-IP header. A less trusted hop must not be able to override a
/// more trusted one. Values that are empty or not valid UTF-8 are skipped.
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(ip) = header_str(headers, "cf-connecting-ip") {
        return ip.to_string();
    }

    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(ip) = header_str(headers, "x-real-ip") {
        return ip.to_string();
    }

    FALLBACK_IDENTIFIER.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
