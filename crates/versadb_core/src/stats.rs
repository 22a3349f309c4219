//! Database statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic operation counters.
///
/// All counters are relaxed atomics; reads taken while operations are in
/// flight are approximate.
#[derive(Debug, Default)]
pub(crate) struct DatabaseStats {
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    sets: AtomicU64,
    gets: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    versions_swept: AtomicU64,
}

impl DatabaseStats {
    pub fn record_begin(&self) {
        self.begun.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rollback(&self) {
        self.rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_swept(&self, count: u64) {
        self.versions_swept.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions_begun: self.begun.load(Ordering::Relaxed),
            transactions_committed: self.committed.load(Ordering::Relaxed),
            transactions_rolled_back: self.rolled_back.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            versions_swept: self.versions_swept.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time view of the database counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Transactions begun.
    pub transactions_begun: u64,
    /// Transactions committed.
    pub transactions_committed: u64,
    /// Transactions rolled back, explicitly or on drop.
    pub transactions_rolled_back: u64,
    /// Successful `set` operations.
    pub sets: u64,
    /// `get` operations, found or not.
    pub gets: u64,
    /// Successful `update` operations.
    pub updates: u64,
    /// Successful `delete` operations.
    pub deletes: u64,
    /// Versions removed by garbage collection.
    pub versions_swept: u64,
}
