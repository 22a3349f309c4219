//! Global transaction status table.

use crate::types::TransactionId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle status of a transaction.
///
/// `Running` is entered at begin; `Committed` and `RolledBack` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// The transaction is in flight.
    Running,
    /// The transaction committed; its versions are publishable.
    Committed,
    /// The transaction rolled back; its versions are garbage.
    RolledBack,
}

/// Side table mapping transaction ids to their status.
///
/// Commit flips a single entry here to publish every version a
/// transaction wrote. The table is bounded by a compaction floor: entries
/// below the floor are dropped and read as `Committed`, which is sound
/// once garbage collection has removed all rolled-back work below the
/// floor (see `Database::gc_outdated`).
#[derive(Debug, Default)]
pub struct TxStatusTable {
    entries: RwLock<HashMap<u64, TxStatus>>,
    floor: AtomicU64,
}

impl TxStatusTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the status of a transaction.
    pub fn set(&self, tx: TransactionId, status: TxStatus) {
        self.entries.write().insert(tx.as_u64(), status);
    }

    /// Returns the status of a transaction.
    ///
    /// Ids below the compaction floor with no explicit entry answer
    /// `Committed`; ids never recorded answer `None`.
    #[must_use]
    pub fn get(&self, tx: TransactionId) -> Option<TxStatus> {
        if let Some(status) = self.entries.read().get(&tx.as_u64()) {
            return Some(*status);
        }
        if tx.as_u64() < self.floor.load(Ordering::Acquire) {
            return Some(TxStatus::Committed);
        }
        None
    }

    /// Returns true if the transaction committed.
    #[must_use]
    pub fn is_committed(&self, tx: TransactionId) -> bool {
        self.get(tx) == Some(TxStatus::Committed)
    }

    /// Returns true if the transaction rolled back.
    #[must_use]
    pub fn is_rolled_back(&self, tx: TransactionId) -> bool {
        self.get(tx) == Some(TxStatus::RolledBack)
    }

    /// Drops non-running entries below `floor` and raises the floor.
    ///
    /// Precondition: no version below the floor still needs a
    /// non-committed answer - the garbage collector establishes this by
    /// sweeping rolled-back versions and stamps first.
    ///
    /// Returns the number of entries dropped.
    pub fn compact_below(&self, floor: TransactionId) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|&id, status| id >= floor.as_u64() || *status == TxStatus::Running);
        self.floor.fetch_max(floor.as_u64(), Ordering::AcqRel);
        before - entries.len()
    }

    /// Returns the number of explicit entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no explicit entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
