//! Multi-version item representation.

use crate::types::TransactionId;
use std::sync::atomic::{AtomicU64, Ordering};

/// One historical state of a key.
///
/// The creation stamp is fixed at construction. The delete stamp is
/// written at most once, by the single in-flight writer, while readers
/// may be scanning the same version concurrently: `deleted_op` is stored
/// first, then `deleted_tx` with release ordering, and readers load
/// `deleted_tx` with acquire ordering before touching `deleted_op`. A
/// version with `deleted_tx == 0` is live.
#[derive(Debug)]
pub struct Version {
    key: String,
    value: String,
    created_tx: TransactionId,
    created_op: u64,
    deleted_tx: AtomicU64,
    deleted_op: AtomicU64,
}

impl Version {
    /// Creates a live version.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        created_tx: TransactionId,
        created_op: u64,
    ) -> Self {
        debug_assert!(!created_tx.is_none());
        Self {
            key: key.into(),
            value: value.into(),
            created_tx,
            created_op,
            deleted_tx: AtomicU64::new(0),
            deleted_op: AtomicU64::new(0),
        }
    }

    /// Returns the key this version belongs to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the id of the transaction that wrote this version.
    #[must_use]
    pub fn created_tx(&self) -> TransactionId {
        self.created_tx
    }

    /// Returns the operation number of the write within its transaction.
    #[must_use]
    pub fn created_op(&self) -> u64 {
        self.created_op
    }

    /// Returns the delete stamp, or `None` while the version is live.
    #[must_use]
    pub fn delete_stamp(&self) -> Option<(TransactionId, u64)> {
        let tx = self.deleted_tx.load(Ordering::Acquire);
        if tx == 0 {
            return None;
        }
        Some((TransactionId::new(tx), self.deleted_op.load(Ordering::Relaxed)))
    }

    /// Returns true if no transaction has tombstoned this version.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.deleted_tx.load(Ordering::Acquire) == 0
    }

    /// Tombstones the version.
    ///
    /// `deleted_op` must be observable by the time `deleted_tx` is, hence
    /// the store ordering.
    pub fn tombstone(&self, tx: TransactionId, op: u64) {
        self.deleted_op.store(op, Ordering::Relaxed);
        self.deleted_tx.store(tx.as_u64(), Ordering::Release);
    }

    /// Clears a delete stamp whose author rolled back.
    ///
    /// Only sound for stamps in a terminal rolled-back state: no
    /// visibility rule can fire on them, so a racing reader observing the
    /// old stamp draws the same conclusion either way.
    pub fn clear_tombstone(&self) {
        self.deleted_tx.store(0, Ordering::Release);
        self.deleted_op.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_version_is_live() {
        let v = Version::new("k", "v", TransactionId::new(1), 1);
        assert!(v.is_live());
        assert_eq!(v.delete_stamp(), None);
        assert_eq!(v.key(), "k");
        assert_eq!(v.value(), "v");
        assert_eq!(v.created_tx(), TransactionId::new(1));
        assert_eq!(v.created_op(), 1);
    }

    #[test]
    fn tombstone_sets_stamp() {
        let v = Version::new("k", "v", TransactionId::new(1), 1);
        v.tombstone(TransactionId::new(3), 7);

        assert!(!v.is_live());
        assert_eq!(v.delete_stamp(), Some((TransactionId::new(3), 7)));
    }

    #[test]
    fn clear_tombstone_revives() {
        let v = Version::new("k", "v", TransactionId::new(1), 1);
        v.tombstone(TransactionId::new(2), 2);
        v.clear_tombstone();

        assert!(v.is_live());
        assert_eq!(v.delete_stamp(), None);
    }
}
