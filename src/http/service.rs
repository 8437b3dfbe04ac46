//! Rate limit decision endpoint.
//!
//! Exposes the limiter to external callers: a client (e.g. a reverse proxy
//! or another service) posts the policy it wants enforced and receives the
//! admit/reject decision as data. Rejection of the *checked* request is a
//! 200 with `allowed: false`; only malformed input is an HTTP error.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::identity::client_identifier;
use crate::ratelimit::{LimitPolicy, RateLimiter};

/// Shared application state for the decision service.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<RateLimiter>,
}

/// Body of a `POST /v1/check` request.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// Maximum requests allowed in the window
    pub limit: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Identifier to count against; derived from headers when absent
    #[serde(default)]
    pub identifier: Option<String>,
}

/// Handle a rate limit check request.
pub async fn check(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CheckRequest>,
) -> Response {
    if request.limit == 0 {
        return invalid_argument("limit must be greater than zero");
    }
    if request.window_seconds == 0 {
        return invalid_argument("window_seconds must be greater than zero");
    }

    let identifier = match request.identifier {
        Some(identifier) if identifier.trim().is_empty() => {
            return invalid_argument("identifier must not be empty");
        }
        Some(identifier) => identifier,
        None => client_identifier(&headers),
    };

    let policy = LimitPolicy::new(request.limit, request.window_seconds);
    let decision = state.limiter.check(&policy, &identifier).await;

    info!(
        identifier = %identifier,
        allowed = decision.allowed,
        remaining = decision.remaining,
        "Rate limit decision made"
    );

    Json(decision).into_response()
}

/// Liveness endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

fn invalid_argument(reason: &str) -> Response {
    warn!(reason, "Rejecting malformed check request");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": reason })),
    )
        .into_response()
}
