//! Turnstile - Fixed-Window Rate Limiting for HTTP APIs
//!
//! This crate implements per-identifier request throttling with fixed,
//! non-sliding time windows. It exposes the limiter as a library (counter
//! store, policies, axum middleware) and as a standalone HTTP decision
//! service. State is process-local by default; the counter store is a trait
//! so a shared external store can back multi-instance deployments.

pub mod http;
pub mod ratelimit;
pub mod config;
pub mod error;
