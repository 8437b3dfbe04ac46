//! HTTP response construction for rate limit outcomes.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::ratelimit::LimitDecision;

/// Echo header carrying the window's total limit.
pub const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// Echo header carrying the remaining quota.
pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// Echo header carrying the window reset time as epoch seconds.
pub const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Build the 429 response for a rejected decision.
pub fn too_many_requests(decision: &LimitDecision) -> Response {
    let body = Json(serde_json::json!({
        "error": "Too many requests",
        "message": format!(
            "Rate limit exceeded. Try again in {} seconds.",
            decision.reset_in
        ),
        "retryAfter": decision.reset_in,
    }));

    let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(decision.reset_in));
    set_quota_headers(headers, decision);

    response
}

/// Add (or overwrite) the rate limit echo headers on a response.
pub fn set_quota_headers(headers: &mut HeaderMap, decision: &LimitDecision) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(decision.limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(reset_epoch(decision)));
}

/// Absolute reset time: now plus the seconds left in the window.
fn reset_epoch(decision: &LimitDecision) -> i64 {
    chrono::Utc::now().timestamp() + decision.reset_in as i64
}
