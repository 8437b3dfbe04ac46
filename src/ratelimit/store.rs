//! Counter storage for rate limit windows.
//!
//! The [`CounterStore`] trait abstracts the backing store so a shared
//! external store (e.g. Redis with atomic increment and TTL) can replace the
//! in-memory map in multi-instance deployments without changing the check
//! contract. The default [`MemoryStore`] keeps state per process.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Source of wall-clock time, injectable for tests.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Stored state for one identifier.
///
/// An entry is logically expired once wall-clock time passes `reset_at_ms`,
/// even if it has not been physically removed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowEntry {
    /// Requests counted in the current window, including the current one
    pub count: u32,
    /// Absolute epoch-millisecond timestamp at which the window ends
    pub reset_at_ms: i64,
}

/// Trait for counter store implementations.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count a request against `identifier`.
    ///
    /// Starts a fresh window at `count = 1` when no entry exists or the
    /// stored entry has expired; otherwise increments the open window's
    /// count. The read-modify-write is atomic per identifier. Returns the
    /// updated entry together with the millisecond clock reading it was
    /// computed against.
    async fn increment(&self, identifier: &str, window: Duration) -> (WindowEntry, i64);

    /// Remove every entry whose window has ended.
    ///
    /// Housekeeping only: expiry is also handled lazily by `increment`, so
    /// skipping a sweep never changes a decision.
    async fn purge_expired(&self);

    /// Number of live entries, expired or not.
    async fn entry_count(&self) -> usize;

    /// Drop all entries.
    async fn clear(&self);
}

/// In-memory counter store.
///
/// State is process-local: in a horizontally scaled deployment each instance
/// enforces its own independent budget.
pub struct MemoryStore {
    entries: DashMap<String, WindowEntry>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create a store backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a store with an injected clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, identifier: &str, window: Duration) -> (WindowEntry, i64) {
        let now = self.clock.now_ms();
        let window_ms = window.as_millis() as i64;

        // The entry guard holds the map shard lock, making the
        // read-modify-write atomic per identifier.
        let mut entry = self
            .entries
            .entry(identifier.to_string())
            .or_insert(WindowEntry {
                count: 0,
                reset_at_ms: now,
            });

        // A hit at exactly reset_at_ms still lands in the open window.
        if entry.count == 0 || now > entry.reset_at_ms {
            *entry = WindowEntry {
                count: 1,
                reset_at_ms: now + window_ms,
            };
        } else {
            entry.count += 1;
        }

        (*entry, now)
    }

    async fn purge_expired(&self) {
        let now = self.clock.now_ms();
        self.entries.retain(|_, entry| now <= entry.reset_at_ms);
    }

    async fn entry_count(&self) -> usize {
        self.entries.len()
    }

    async fn clear(&self) {
        self.entries.clear();
    }
}

/// Manually advanced clock for deterministic tests.
#[cfg(test)]
pub(crate) struct ManualClock {
    now_ms: std::sync::atomic::AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            now_ms: std::sync::atomic::AtomicI64::new(1_700_000_000_000),
        }
    }

    pub(crate) fn advance_ms(&self, ms: i64) {
        self.now_ms
            .fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new());
        let store = MemoryStore::with_clock(clock.clone());
        (clock, store)
    }

    #[tokio::test]
    async fn test_first_hit_starts_window() {
        let (clock, store) = manual_store();
        let start = clock.now_ms();

        let (entry, now) = store.increment("10.0.0.1", Duration::from_secs(60)).await;

        assert_eq!(entry.count, 1);
        assert_eq!(entry.reset_at_ms, start + 60_000);
        assert_eq!(now, start);
    }

    #[tokio::test]
    async fn test_hits_accumulate_within_window() {
        let (_clock, store) = manual_store();

        store.increment("10.0.0.1", Duration::from_secs(60)).await;
        let (entry, _) = store.increment("10.0.0.1", Duration::from_secs(60)).await;

        assert_eq!(entry.count, 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_replaced() {
        let (clock, store) = manual_store();

        store.increment("10.0.0.1", Duration::from_secs(60)).await;
        clock.advance_ms(60_001);
        let (entry, now) = store.increment("10.0.0.1", Duration::from_secs(60)).await;

        assert_eq!(entry.count, 1);
        assert_eq!(entry.reset_at_ms, now + 60_000);
    }

    #[tokio::test]
    async fn test_boundary_hit_counts_against_open_window() {
        let (clock, store) = manual_store();

        store.increment("10.0.0.1", Duration::from_secs(60)).await;
        clock.advance_ms(60_000);
        let (entry, _) = store.increment("10.0.0.1", Duration::from_secs(60)).await;

        assert_eq!(entry.count, 2);
    }

    #[tokio::test]
    async fn test_identifiers_do_not_share_entries() {
        let (_clock, store) = manual_store();

        store.increment("10.0.0.1", Duration::from_secs(60)).await;
        let (entry, _) = store.increment("10.0.0.2", Duration::from_secs(60)).await;

        assert_eq!(entry.count, 1);
        assert_eq!(store.entry_count().await, 2);
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_entries() {
        let (clock, store) = manual_store();

        store.increment("old", Duration::from_secs(1)).await;
        clock.advance_ms(500);
        store.increment("fresh", Duration::from_secs(60)).await;
        clock.advance_ms(501);

        store.purge_expired().await;

        assert_eq!(store.entry_count().await, 1);
        let (entry, _) = store.increment("fresh", Duration::from_secs(60)).await;
        assert_eq!(entry.count, 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let (_clock, store) = manual_store();

        store.increment("10.0.0.1", Duration::from_secs(60)).await;
        store.clear().await;

        assert_eq!(store.entry_count().await, 0);
    }
}
