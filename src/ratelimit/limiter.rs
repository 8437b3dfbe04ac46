//! Core rate limiter implementation.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

use super::policy::LimitPolicy;
use super::store::{CounterStore, MemoryStore};

/// The outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Number of requests remaining in the current window
    pub remaining: u32,
    /// Total limit for this window
    pub limit: u32,
    /// Seconds until the current window resets
    pub reset_in: u64,
}

/// Fixed-window rate limiter over a pluggable counter store.
///
/// Windows never slide and are never extended by traffic inside them: only
/// expiry starts a fresh window, so a caller cannot stretch its own window
/// by hammering requests.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
}

impl RateLimiter {
    /// Create a rate limiter backed by an in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Create a rate limiter over a custom counter store.
    pub fn with_store(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Check the rate limit for an identifier under the given policy.
    ///
    /// Counts the request and returns the decision. Policies are trusted:
    /// a zero limit or window is the caller's responsibility to reject
    /// before reaching this point.
    pub async fn check(&self, policy: &LimitPolicy, identifier: &str) -> LimitDecision {
        trace!(identifier, limit = policy.limit, "Checking rate limit");

        let (entry, now_ms) = self.store.increment(identifier, policy.window()).await;

        let allowed = entry.count <= policy.limit;
        let remaining = policy.limit.saturating_sub(entry.count);
        // Ceiling division keeps reset_in at the full window for a fresh
        // entry; the clamp keeps it positive at the millisecond boundary.
        let reset_in = (((entry.reset_at_ms - now_ms) + 999) / 1000).max(1) as u64;

        if !allowed {
            debug!(identifier, count = entry.count, "Rate limit exceeded");
        }

        LimitDecision {
            allowed,
            remaining,
            limit: policy.limit,
            reset_in,
        }
    }

    /// Remove expired entries from the store.
    ///
    /// Bounds memory growth from one-off identifiers. The host application
    /// schedules this; the limiter never starts its own timer.
    pub async fn sweep(&self) {
        self.store.purge_expired().await;
        let entries = self.store.entry_count().await;
        debug!(entries, "Swept expired rate limit entries");
    }

    /// Number of tracked identifiers.
    pub async fn entry_count(&self) -> usize {
        self.store.entry_count().await
    }

    /// Drop all tracked state.
    ///
    /// This is primarily useful for testing.
    pub async fn clear(&self) {
        self.store.clear().await;
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
