//! Windowed counter storage backing the rate limiter.
//!
//! # Responsibilities
//! - Atomic increment-or-reset per composite key
//! - Periodic sweep of expired entries on a fixed interval
//! - Deterministic time via an injectable clock (tests drive rollover)
//!
//! # Design Decisions
//! - DashMap entry API gives a single-writer critical section per key, so
//!   concurrent increments to the same key cannot lose updates
//! - The store is an explicit service object owned by the server, not a
//!   module-wide global; the sweeper is a cancellable task
//! - Sweep only removes entries already past `reset_at` at the moment of
//!   inspection; an entry refreshed mid-sweep survives

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

/// Source of the current time in milliseconds since the Unix epoch.
///
/// Production uses [`SystemClock`]; tests substitute a manual clock to step
/// through window boundaries without sleeping.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: std::sync::atomic::AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: std::sync::atomic::AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms
            .fetch_add(delta_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Live counter for one `(identifier, policy)` key.
///
/// `count` is monotonically non-decreasing within a window and resets to 1
/// when a new window opens. At most one live entry exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterEntry {
    pub count: u32,
    /// End of the current window, ms since epoch.
    pub reset_at_ms: i64,
}

/// In-memory map from composite key to counter + expiry.
pub struct WindowedCounterStore {
    entries: DashMap<String, CounterEntry>,
    clock: Arc<dyn Clock>,
}

impl WindowedCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Increment the counter for `key`, opening a fresh window when none is
    /// live. Returns a snapshot of the entry after the mutation.
    ///
    /// Exactly one mutation happens per call, including calls whose caller
    /// will go on to reject the request.
    pub fn increment(&self, key: &str, window_ms: i64) -> CounterEntry {
        let now = self.clock.now_ms();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert(CounterEntry {
                count: 0,
                reset_at_ms: now + window_ms,
            });

        if now > entry.reset_at_ms {
            // Window rolled over: replace rather than accumulate.
            *entry = CounterEntry {
                count: 1,
                reset_at_ms: now + window_ms,
            };
        } else {
            entry.count = entry.count.saturating_add(1);
        }

        *entry
    }

    /// Remove entries whose window has passed. Returns how many were evicted.
    ///
    /// Uses `retain`, which re-checks each entry under its shard lock, so a
    /// key incremented while the sweep is in flight is never evicted inside
    /// its new window.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at_ms >= now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of live entries (includes expired ones not yet swept).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Spawn the periodic sweeper. The returned handle aborts the task when
    /// dropped, so the store owns its background work for its whole lifetime.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let store = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick fires immediately; skip it so a fresh store isn't
            // swept before it has seen any traffic.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = store.sweep();
                if evicted > 0 {
                    tracing::debug!(evicted, "Swept expired rate-limit counters");
                }
            }
        });
        SweeperHandle { handle }
    }
}

/// Cancellable handle to the background sweep task.
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
