//! Item store: per-key version chains.

use crate::status::TxStatusTable;
use crate::types::TransactionId;
use crate::version::Version;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of a garbage-collection sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SweepStats {
    /// Versions removed from chains.
    pub versions_removed: usize,
    /// Rolled-back delete stamps cleared.
    pub stamps_cleared: usize,
}

/// Mapping from key to the ordered sequence of versions of that key.
///
/// Chains grow by appending at the tail, so versions are stored in
/// creation order. `chain` hands out a snapshot - a clone of the Arc
/// vector - so readers can scan without holding the map lock.
#[derive(Debug, Default)]
pub(crate) struct ItemStore {
    chains: RwLock<HashMap<String, Vec<Arc<Version>>>>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a version at the tail of its key's chain.
    pub fn append(&self, version: Arc<Version>) {
        self.chains
            .write()
            .entry(version.key().to_string())
            .or_default()
            .push(version);
    }

    /// Returns a snapshot of the chain for `key`, oldest first.
    pub fn chain(&self, key: &str) -> Vec<Arc<Version>> {
        self.chains.read().get(key).cloned().unwrap_or_default()
    }

    /// Returns a snapshot of all known keys.
    pub fn keys(&self) -> Vec<String> {
        self.chains.read().keys().cloned().collect()
    }

    /// Returns the number of known keys.
    pub fn key_count(&self) -> usize {
        self.chains.read().len()
    }

    /// Returns the total number of versions across all chains.
    pub fn version_count(&self) -> usize {
        self.chains.read().values().map(Vec::len).sum()
    }

    /// Removes versions no current or future transaction can observe.
    ///
    /// A version is removable when its creator rolled back, or when a
    /// committed delete superseded it and no transaction in `active` has
    /// an id in `[created_tx, deleted_tx)`. Delete stamps authored by
    /// rolled-back transactions are cleared so the status table can be
    /// compacted afterwards.
    ///
    /// Holds the map write lock for the duration; never runs concurrently
    /// with a chain iteration.
    pub fn sweep(&self, statuses: &TxStatusTable, active: &[TransactionId]) -> SweepStats {
        let mut stats = SweepStats::default();
        let mut chains = self.chains.write();

        for versions in chains.values_mut() {
            versions.retain(|v| {
                if statuses.is_rolled_back(v.created_tx()) {
                    stats.versions_removed += 1;
                    return false;
                }

                if let Some((deleted_tx, _)) = v.delete_stamp() {
                    if statuses.is_rolled_back(deleted_tx) {
                        v.clear_tombstone();
                        stats.stamps_cleared += 1;
                    } else if statuses.is_committed(deleted_tx) {
                        let observable = active
                            .iter()
                            .any(|&tx| tx >= v.created_tx() && tx < deleted_tx);
                        if !observable {
                            stats.versions_removed += 1;
                            return false;
                        }
                    }
                }

                true
            });
        }

        chains.retain(|_, versions| !versions.is_empty());
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::TxStatus;

    fn version(key: &str, value: &str, tx: u64) -> Arc<Version> {
        Arc::new(Version::new(key, value, TransactionId::new(tx), 1))
    }

    #[test]
    fn append_preserves_creation_order() {
        let store = ItemStore::new();
        store.append(version("k", "a", 1));
        store.append(version("k", "b", 2));

        let chain = store.chain("k");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].value(), "a");
        assert_eq!(chain[1].value(), "b");
    }

    #[test]
    fn chain_of_unknown_key_is_empty() {
        let store = ItemStore::new();
        assert!(store.chain("missing").is_empty());
    }

    #[test]
    fn keys_and_counts() {
        let store = ItemStore::new();
        store.append(version("a", "1", 1));
        store.append(version("b", "2", 1));
        store.append(version("b", "3", 2));

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(store.key_count(), 2);
        assert_eq!(store.version_count(), 3);
    }

    #[test]
    fn sweep_removes_rolled_back_versions() {
        let store = ItemStore::new();
        let statuses = TxStatusTable::new();
        statuses.set(TransactionId::new(1), TxStatus::RolledBack);

        store.append(version("k", "v", 1));
        let stats = store.sweep(&statuses, &[]);

        assert_eq!(stats.versions_removed, 1);
        assert_eq!(store.key_count(), 0);
    }

    #[test]
    fn sweep_removes_superseded_versions() {
        let store = ItemStore::new();
        let statuses = TxStatusTable::new();
        statuses.set(TransactionId::new(1), TxStatus::Committed);
        statuses.set(TransactionId::new(2), TxStatus::Committed);

        let old = version("k", "old", 1);
        old.tombstone(TransactionId::new(2), 1);
        store.append(old);
        store.append(version("k", "new", 2));

        let stats = store.sweep(&statuses, &[]);
        assert_eq!(stats.versions_removed, 1);

        let chain = store.chain("k");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].value(), "new");
    }

    #[test]
    fn sweep_keeps_versions_an_active_reader_needs() {
        let store = ItemStore::new();
        let statuses = TxStatusTable::new();
        statuses.set(TransactionId::new(1), TxStatus::Committed);
        statuses.set(TransactionId::new(3), TxStatus::Committed);

        // Deleted at tx 3, reader tx 2 still sees it.
        let v = version("k", "v", 1);
        v.tombstone(TransactionId::new(3), 1);
        store.append(v);

        let stats = store.sweep(&statuses, &[TransactionId::new(2)]);
        assert_eq!(stats.versions_removed, 0);
        assert_eq!(store.chain("k").len(), 1);
    }

    #[test]
    fn sweep_clears_rolled_back_stamps() {
        let store = ItemStore::new();
        let statuses = TxStatusTable::new();
        statuses.set(TransactionId::new(1), TxStatus::Committed);
        statuses.set(TransactionId::new(2), TxStatus::RolledBack);

        let v = version("k", "v", 1);
        v.tombstone(TransactionId::new(2), 1);
        store.append(v);

        let stats = store.sweep(&statuses, &[]);
        assert_eq!(stats.stamps_cleared, 1);
        assert!(store.chain("k")[0].is_live());
    }
}
