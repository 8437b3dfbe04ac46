//! Rate limiting middleware.
//!
//! Wraps arbitrary route handlers with the check-then-call-then-annotate
//! pattern: extract the caller identifier, consult the limiter, short-circuit
//! with a 429 on rejection, and stamp quota headers on admitted responses.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use super::identity::client_identifier;
use super::respond::{set_quota_headers, too_many_requests};
use crate::ratelimit::{LimitPolicy, RateLimiter};

/// Shared state for one guarded route group: the limiter plus the policy
/// applied to every request passing through it.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub policy: LimitPolicy,
}

impl RateLimitState {
    pub fn new(limiter: Arc<RateLimiter>, policy: LimitPolicy) -> Self {
        Self { limiter, policy }
    }
}

/// Middleware function enforcing the configured policy.
///
/// Apply with `axum::middleware::from_fn_with_state`. On rejection the inner
/// handler never runs, so none of its side effects occur. Errors raised by
/// the inner handler propagate untouched.
pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = match &state.policy.identifier {
        Some(identifier) => identifier.clone(),
        None => client_identifier(request.headers()),
    };

    let decision = state.limiter.check(&state.policy, &identifier).await;

    if !decision.allowed {
        return too_many_requests(&decision);
    }

    let mut response = next.run(request).await;
    set_quota_headers(response.headers_mut(), &decision);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::respond::{LIMIT_HEADER, REMAINING_HEADER, RESET_HEADER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn guarded_router(policy: LimitPolicy, hits: Arc<AtomicUsize>) -> Router {
        let state = RateLimitState::new(Arc::new(RateLimiter::new()), policy);
        Router::new()
            .route(
                "/",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "OK"
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(state, enforce))
    }

    fn request_from(ip: &str) -> Request<Body> {
        Request::builder()
            .uri("/")
            .header("cf-connecting-ip", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_admitted_response_carries_quota_headers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = guarded_router(LimitPolicy::new(10, 60), hits.clone());

        let response = router.oneshot(request_from("1.2.3.4")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(LIMIT_HEADER).unwrap(), "10");
        assert_eq!(response.headers().get(REMAINING_HEADER).unwrap(), "9");
        assert!(response.headers().contains_key(RESET_HEADER));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejection_short_circuits_the_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = guarded_router(LimitPolicy::new(2, 60), hits.clone());

        for _ in 0..2 {
            let response = router
                .clone()
                .oneshot(request_from("1.2.3.4"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let blocked = router.oneshot(request_from("1.2.3.4")).await.unwrap();

        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(blocked.headers().get(REMAINING_HEADER).unwrap(), "0");
        // The wrapped handler must not have run for the rejected request.
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_budgets_are_per_identifier() {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = guarded_router(LimitPolicy::new(1, 60), hits.clone());

        let first = router
            .clone()
            .oneshot(request_from("1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let other = router.oneshot(request_from("5.6.7.8")).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_identifier_override_pools_all_callers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let policy = LimitPolicy::new(1, 60).with_identifier("global");
        let router = guarded_router(policy, hits.clone());

        let first = router
            .clone()
            .oneshot(request_from("1.2.3.4"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = router.oneshot(request_from("5.6.7.8")).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
