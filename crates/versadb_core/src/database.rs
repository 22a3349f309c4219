//! Database facade, visibility rules, and recovery.

use crate::aof::{Aof, LogRecord};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexSet;
use crate::stats::{DatabaseStats, StatsSnapshot};
use crate::status::{TxStatus, TxStatusTable};
use crate::store::ItemStore;
use crate::transaction::Transaction;
use crate::types::TransactionId;
use crate::version::Version;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex, RwLock};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;
use versadb_storage::{FileBackend, StorageBackend, StorageError};

/// Owned guard of the database writer mutex, held by a writable
/// transaction from begin to commit/rollback.
pub(crate) type WriterGuard = ArcMutexGuard<RawMutex, ()>;

/// Outcome of a [`Database::gc_outdated`] pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcReport {
    /// Versions removed from the item store.
    pub versions_removed: usize,
    /// Rolled-back delete stamps cleared.
    pub stamps_cleared: usize,
    /// Status-table entries dropped by compaction.
    pub statuses_dropped: usize,
}

/// The main database handle.
///
/// All access goes through transactions: [`Database::begin`] hands out a
/// [`Transaction`] bound to this database. Opening with `persistent =
/// true` replays the append-only log before the handle is returned, so
/// the store reflects the last committed state.
///
/// # Example
///
/// ```rust
/// use versadb_core::Database;
///
/// let db = Database::open_in_memory().unwrap();
/// let mut tx = db.begin(true).unwrap();
/// tx.set("greeting", "hello").unwrap();
/// tx.commit().unwrap();
///
/// let mut tx = db.begin(false).unwrap();
/// assert_eq!(tx.get("greeting").unwrap(), "hello");
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

pub(crate) struct DatabaseInner {
    pub(crate) items: ItemStore,
    /// The published index set; swapped wholesale at writer commit.
    pub(crate) indexes: RwLock<Arc<IndexSet>>,
    pub(crate) statuses: TxStatusTable,
    pub(crate) stats: DatabaseStats,
    last_tx: AtomicU64,
    writer: Arc<Mutex<()>>,
    active: Mutex<Vec<TransactionId>>,
    pub(crate) log: Option<Aof>,
    open: AtomicBool,
}

impl Database {
    /// Opens a database.
    ///
    /// With `persistent = false` the path is ignored and nothing touches
    /// disk. With `persistent = true` the log file at `path` is opened
    /// (created if missing) and replayed.
    ///
    /// # Errors
    ///
    /// `OpenFile` if the log cannot be opened.
    pub fn open(path: impl AsRef<Path>, persistent: bool) -> CoreResult<Self> {
        Self::open_with_config(path, persistent, Config::default())
    }

    /// Opens a database with custom configuration.
    ///
    /// # Errors
    ///
    /// `OpenFile` if the log cannot be opened, or if it does not exist
    /// and `create_if_missing` is off.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        persistent: bool,
        config: Config,
    ) -> CoreResult<Self> {
        if !persistent {
            return Self::bootstrap(None);
        }

        let path = path.as_ref();
        if !config.create_if_missing && !path.exists() {
            return Err(CoreError::OpenFile {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "log file missing"),
            });
        }

        let backend = FileBackend::open_with_create_dirs(path).map_err(|err| match err {
            StorageError::Io(source) => CoreError::OpenFile {
                path: path.to_path_buf(),
                source,
            },
            other => CoreError::Storage(other),
        })?;
        debug!(path = %path.display(), "opening persistent database");
        Self::bootstrap(Some(Aof::new(Box::new(backend), config.sync_on_commit)))
    }

    /// Opens a persistent database over a pre-built backend.
    ///
    /// Useful for replaying into memory in tests and tooling.
    ///
    /// # Errors
    ///
    /// Fails if the backend cannot be read during replay.
    pub fn open_with_backend(
        backend: Box<dyn StorageBackend>,
        config: Config,
    ) -> CoreResult<Self> {
        Self::bootstrap(Some(Aof::new(backend, config.sync_on_commit)))
    }

    /// Opens a fresh in-memory database with no durability.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::bootstrap(None)
    }

    /// Replays the log (if any) and assembles the handle.
    fn bootstrap(log: Option<Aof>) -> CoreResult<Self> {
        let items = ItemStore::new();
        let statuses = TxStatusTable::new();
        let mut last = 0u64;

        if let Some(log) = &log {
            log.replay(|record| {
                match record {
                    LogRecord::Set {
                        key,
                        value,
                        created_tx,
                        deleted_tx,
                    } => {
                        // Reuse the stamp the writer recorded; logs from
                        // older writers may omit it.
                        let tx = if created_tx.is_none() {
                            TransactionId::new(last + 1)
                        } else {
                            created_tx
                        };
                        last = last.max(tx.as_u64());
                        statuses.set(tx, TxStatus::Committed);

                        let version = Arc::new(Version::new(key, value, tx, 1));
                        if !deleted_tx.is_none() {
                            last = last.max(deleted_tx.as_u64());
                            statuses.set(deleted_tx, TxStatus::Committed);
                            version.tombstone(deleted_tx, 1);
                        }
                        items.append(version);
                    }
                    LogRecord::Del { key } => {
                        let chain = items.chain(&key);
                        if let Some(live) = chain.iter().rev().find(|v| v.is_live()) {
                            last += 1;
                            let tx = TransactionId::new(last);
                            statuses.set(tx, TxStatus::Committed);
                            live.tombstone(tx, 1);
                        }
                    }
                }
                Ok(())
            })?;
        }

        let inner = DatabaseInner {
            items,
            indexes: RwLock::new(Arc::new(IndexSet::new())),
            statuses,
            stats: DatabaseStats::default(),
            last_tx: AtomicU64::new(last),
            writer: Arc::new(Mutex::new(())),
            active: Mutex::new(Vec::new()),
            log,
            open: AtomicBool::new(true),
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Begins a transaction.
    ///
    /// `begin(true)` blocks until the current writer (if any) commits or
    /// rolls back; a writer's id is allocated after the writer mutex is
    /// acquired, so it exceeds the id of every committed writer and its
    /// existence check in `set` cannot miss a committed key.
    ///
    /// # Errors
    ///
    /// `TxClosed` if the database has been closed.
    pub fn begin(&self, writable: bool) -> CoreResult<Transaction> {
        let inner = &self.inner;
        if !inner.open.load(Ordering::SeqCst) {
            return Err(CoreError::TxClosed);
        }

        let guard = if writable {
            Some(inner.writer.lock_arc())
        } else {
            None
        };

        let id = TransactionId::new(inner.last_tx.fetch_add(1, Ordering::SeqCst) + 1);
        inner.statuses.set(id, TxStatus::Running);
        inner.active.lock().push(id);

        let staged = writable.then(|| IndexSet::clone(&inner.published_indexes()));
        inner.stats.record_begin();
        debug!(%id, writable, "transaction begun");

        Ok(Transaction::new(
            Arc::clone(inner),
            id,
            writable,
            staged,
            guard,
        ))
    }

    /// Removes versions and status entries nothing can observe anymore.
    ///
    /// Safe to call at any time; holds the item-store write lock for the
    /// duration of the sweep.
    pub fn gc_outdated(&self) -> GcReport {
        let inner = &self.inner;
        let active: Vec<TransactionId> = inner.active.lock().clone();

        let swept = inner.items.sweep(&inner.statuses, &active);

        // With no active transactions, everything allocated so far is
        // terminal and compactable.
        let floor = active
            .iter()
            .min()
            .copied()
            .unwrap_or_else(|| TransactionId::new(inner.last_tx.load(Ordering::SeqCst) + 1));
        let statuses_dropped = inner.statuses.compact_below(floor);

        inner.stats.record_swept(swept.versions_removed as u64);
        debug!(
            versions_removed = swept.versions_removed,
            stamps_cleared = swept.stamps_cleared,
            statuses_dropped,
            "garbage collection finished"
        );

        GcReport {
            versions_removed: swept.versions_removed,
            stamps_cleared: swept.stamps_cleared,
            statuses_dropped,
        }
    }

    /// Flushes and closes the durability log. Idempotent.
    ///
    /// Transactions begun before `close` keep reading; a commit that
    /// needs the log fails with the storage `Closed` error.
    ///
    /// # Errors
    ///
    /// Fails if the final flush or sync fails.
    pub fn close(&self) -> CoreResult<()> {
        if !self.inner.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("closing database");
        if let Some(log) = &self.inner.log {
            log.close()?;
        }
        Ok(())
    }

    /// Returns the status of a transaction id.
    ///
    /// Every id ever allocated answers: `Running` from begin, then
    /// terminally `Committed` or `RolledBack`. Ids compacted away by
    /// garbage collection answer `Committed`; ids never allocated answer
    /// `None`.
    #[must_use]
    pub fn tx_status(&self, id: TransactionId) -> Option<TxStatus> {
        self.inner.statuses.get(id)
    }

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Returns the number of known keys, including keys whose only
    /// versions are tombstoned or unreachable.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.inner.items.key_count()
    }

    /// Returns the total number of versions across all chains.
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.inner.items.version_count()
    }
}

impl DatabaseInner {
    /// Returns the currently published index set.
    pub(crate) fn published_indexes(&self) -> Arc<IndexSet> {
        Arc::clone(&self.indexes.read())
    }

    /// Removes a finished transaction from the active list.
    pub(crate) fn retire(&self, id: TransactionId) {
        self.active.lock().retain(|&tx| tx != id);
    }

    /// Decides which version of `key`, if any, transaction `tx` observes
    /// at operation number `op`.
    ///
    /// The chain is scanned newest to oldest; the first rule that fires
    /// decides:
    ///
    /// 1. deleted by `tx` before `op` - not found
    /// 2. deleted by `tx` at or after `op` - visible (pre-delete state)
    /// 3. created by `tx` before `op` - visible (own write)
    /// 4. created by `tx` at or after `op` - skip (own future write)
    /// 5. deleted by a committed transaction with id <= `tx` - not found
    /// 6. created by a committed transaction with id <= `tx` - visible
    /// 7. otherwise skip
    pub(crate) fn visible_version(
        &self,
        key: &str,
        tx: TransactionId,
        op: u64,
    ) -> Option<Arc<Version>> {
        let chain = self.items.chain(key);

        for version in chain.iter().rev() {
            let stamp = version.delete_stamp();

            if let Some((deleted_tx, deleted_op)) = stamp {
                if deleted_tx == tx {
                    if op > deleted_op {
                        return None;
                    }
                    return Some(Arc::clone(version));
                }
            }

            if version.created_tx() == tx {
                if op > version.created_op() {
                    return Some(Arc::clone(version));
                }
                continue;
            }

            if let Some((deleted_tx, _)) = stamp {
                if deleted_tx <= tx && self.statuses.is_committed(deleted_tx) {
                    return None;
                }
            }

            if version.created_tx() <= tx && self.statuses.is_committed(version.created_tx()) {
                return Some(Arc::clone(version));
            }
        }

        None
    }
}

impl std::fmt::Debug for DatabaseInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseInner")
            .field("keys", &self.items.key_count())
            .field("versions", &self.items.version_count())
            .field("last_tx", &self.last_tx.load(Ordering::Relaxed))
            .field("persistent", &self.log.is_some())
            .finish_non_exhaustive()
    }
}
