//! HTTP server bootstrap.

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

use super::middleware::{enforce, RateLimitState};
use super::service::{self, AppState};
use crate::error::{Result, TurnstileError};
use crate::ratelimit::{LimitPolicy, RateLimiter};

/// HTTP server for the rate limit decision service.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The rate limiter instance
    limiter: Arc<RateLimiter>,
    /// Policy guarding the service's own API
    guard: LimitPolicy,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(addr: SocketAddr, limiter: Arc<RateLimiter>, guard: LimitPolicy) -> Self {
        Self {
            addr,
            limiter,
            guard,
        }
    }

    /// Build the router: the decision endpoint behind the guard policy,
    /// the health endpoint in front of it.
    pub fn router(&self) -> Router {
        let guard_state = RateLimitState::new(self.limiter.clone(), self.guard.clone());
        let app_state = AppState {
            limiter: self.limiter.clone(),
        };

        Router::new()
            .route("/v1/check", post(service::check))
            .layer(axum::middleware::from_fn_with_state(guard_state, enforce))
            .route("/health", get(service::health))
            .with_state(app_state)
    }

    /// Start the HTTP server.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        self.run(std::future::pending()).await
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.run(signal).await
    }

    async fn run<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.addr).await?;

        info!(addr = %self.addr, "Starting HTTP server");

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                TurnstileError::Io(e)
            })
    }
}
