//! Rate limit policies and presets.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single rate limit call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitPolicy {
    /// Maximum requests allowed in the time window
    pub limit: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Optional custom identifier (overrides header-based extraction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl LimitPolicy {
    /// Create a policy with no identifier override.
    pub const fn new(limit: u32, window_seconds: u64) -> Self {
        Self {
            limit,
            window_seconds,
            identifier: None,
        }
    }

    /// Pin this policy to a fixed identifier instead of deriving one per request.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// The window length as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Fixed policy presets for common use cases.
pub mod presets {
    use super::LimitPolicy;

    /// Strict: 5 requests per minute. For login, signup, password reset.
    pub const STRICT: LimitPolicy = LimitPolicy::new(5, 60);

    /// Moderate: 30 requests per minute. For mutations (POST, PUT, DELETE).
    pub const MODERATE: LimitPolicy = LimitPolicy::new(30, 60);

    /// Relaxed: 100 requests per minute. For reads (GET).
    pub const RELAXED: LimitPolicy = LimitPolicy::new(100, 60);

    /// AI: 10 requests per hour. For expensive inference calls.
    pub const AI: LimitPolicy = LimitPolicy::new(10, 3600);
}
