//! Transaction handle and operations.

use crate::aof::LogRecord;
use crate::database::{DatabaseInner, WriterGuard};
use crate::error::{CoreError, CoreResult};
use crate::index::{Index, IndexSet};
use crate::status::TxStatus;
use crate::types::TransactionId;
use crate::version::Version;
use std::sync::Arc;
use tracing::debug;

/// A transaction over the database.
///
/// Obtained from [`crate::Database::begin`]. Read-only transactions run
/// concurrently with each other and with one writer; writable
/// transactions hold the database writer mutex from begin to
/// commit/rollback, so at most one exists at a time.
///
/// Every operation consumes one number from the transaction's operation
/// counter; within the transaction, reads observe exactly the writes with
/// smaller operation numbers (read-your-own-writes).
///
/// Dropping a transaction that was neither committed nor rolled back
/// rolls it back.
pub struct Transaction {
    db: Option<Arc<DatabaseInner>>,
    id: TransactionId,
    writable: bool,
    ops: u64,
    /// Private clone of the published index set; `None` for readers.
    staged: Option<IndexSet>,
    /// Log records in the order this transaction produced them.
    write_set: Vec<LogRecord>,
    /// Writer mutex guard; dropping it is the release.
    guard: Option<WriterGuard>,
}

impl Transaction {
    pub(crate) fn new(
        db: Arc<DatabaseInner>,
        id: TransactionId,
        writable: bool,
        staged: Option<IndexSet>,
        guard: Option<WriterGuard>,
    ) -> Self {
        Self {
            db: Some(db),
            id,
            writable,
            ops: 0,
            staged,
            write_set: Vec::new(),
            guard,
        }
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns true if this transaction can mutate the database.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Returns true until the transaction commits or rolls back.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.db.is_some()
    }

    /// Creates a key.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the key is visible to this transaction,
    /// `TxClosed` / `NotWritable` on contract violations.
    pub fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let db = self.handle()?;
        self.check_writable()?;
        let op = self.next_op();

        if db.visible_version(key, self.id, op).is_some() {
            return Err(CoreError::AlreadyExists);
        }

        let version = Arc::new(Version::new(key, value, self.id, op));
        db.items.append(Arc::clone(&version));
        if let Some(staged) = self.staged.as_mut() {
            staged.insert_version(&version, None);
        }
        self.write_set.push(LogRecord::set(key, value, self.id));
        db.stats.record_set();
        Ok(())
    }

    /// Returns the value visible to this transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key never existed, was deleted, or is not yet
    /// visible; `TxClosed` after commit/rollback.
    pub fn get(&mut self, key: &str) -> CoreResult<String> {
        let db = self.handle()?;
        let op = self.next_op();
        db.stats.record_get();

        match db.visible_version(key, self.id, op) {
            Some(version) => Ok(version.value().to_string()),
            None => Err(CoreError::NotFound),
        }
    }

    /// Replaces the value of an existing key.
    ///
    /// The visible version is tombstoned and a fresh version appended,
    /// both stamped with this transaction and operation.
    ///
    /// # Errors
    ///
    /// `NotFound` if no version is visible, `TxClosed` / `NotWritable`
    /// on contract violations.
    pub fn update(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let db = self.handle()?;
        self.check_writable()?;
        let op = self.next_op();

        let current = db
            .visible_version(key, self.id, op)
            .ok_or(CoreError::NotFound)?;
        current.tombstone(self.id, op);

        let version = Arc::new(Version::new(key, value, self.id, op));
        db.items.append(Arc::clone(&version));
        if let Some(staged) = self.staged.as_mut() {
            staged.remove_version(&current, None);
            staged.insert_version(&version, None);
        }
        self.write_set.push(LogRecord::del(key));
        self.write_set.push(LogRecord::set(key, value, self.id));
        db.stats.record_update();
        Ok(())
    }

    /// Deletes a key.
    ///
    /// Deleting a key this transaction already deleted reports
    /// `NotFound`.
    ///
    /// # Errors
    ///
    /// `NotFound` if no version is visible, `TxClosed` / `NotWritable`
    /// on contract violations.
    pub fn delete(&mut self, key: &str) -> CoreResult<()> {
        let db = self.handle()?;
        self.check_writable()?;
        let op = self.next_op();

        let current = db
            .visible_version(key, self.id, op)
            .ok_or(CoreError::NotFound)?;
        current.tombstone(self.id, op);

        if let Some(staged) = self.staged.as_mut() {
            staged.remove_version(&current, None);
        }
        self.write_set.push(LogRecord::del(key));
        db.stats.record_delete();
        Ok(())
    }

    /// Adds a secondary index and populates it from this transaction's
    /// visible snapshot.
    ///
    /// The index becomes visible to other transactions at commit.
    ///
    /// # Errors
    ///
    /// `EmptyIndex` / `IndexExists` from the staged set, `TxClosed` /
    /// `NotWritable` on contract violations.
    pub fn add_index(&mut self, index: Index) -> CoreResult<()> {
        let db = self.handle()?;
        self.check_writable()?;
        let op = self.next_op();
        let name = index.name().to_string();

        match self.staged.as_mut() {
            Some(staged) => staged.add(index)?,
            None => return Err(CoreError::NotWritable),
        }

        for key in db.items.keys() {
            if let Some(version) = db.visible_version(&key, self.id, op) {
                if let Some(staged) = self.staged.as_mut() {
                    staged.insert_version(&version, Some(&name));
                }
            }
        }
        Ok(())
    }

    /// Visits `(key, value)` pairs of the named index in ascending order.
    ///
    /// A writer iterates its staged set; a reader iterates the index set
    /// published at the time of the call. The visitor returns true to
    /// continue, false to stop.
    ///
    /// # Errors
    ///
    /// `EmptyIndex` for an empty name, `UnknownIndex` if absent,
    /// `TxClosed` after commit/rollback.
    pub fn ascend(&self, name: &str, visitor: impl FnMut(&str, &str) -> bool) -> CoreResult<()> {
        let db = self.db.as_ref().ok_or(CoreError::TxClosed)?;
        if name.is_empty() {
            return Err(CoreError::EmptyIndex);
        }

        let unknown = || CoreError::UnknownIndex {
            name: name.to_string(),
        };
        match &self.staged {
            Some(staged) => staged.get(name).ok_or_else(unknown)?.ascend(visitor),
            None => {
                let published = db.published_indexes();
                published.get(name).ok_or_else(unknown)?.ascend(visitor);
            }
        }
        Ok(())
    }

    /// Commits the transaction.
    ///
    /// For a writer: publishes the staged index set, marks the
    /// transaction committed, appends the write set to the log, and
    /// releases the writer mutex - in that order. Commit is the
    /// linearization point; readers that began earlier keep their
    /// snapshot, readers that begin later see everything.
    ///
    /// # Errors
    ///
    /// `TxClosed` if already finished. A log append failure is returned
    /// after the in-memory publish has happened.
    pub fn commit(&mut self) -> CoreResult<()> {
        let db = self.db.take().ok_or(CoreError::TxClosed)?;
        let mut result = Ok(());

        if self.writable {
            if let Some(staged) = self.staged.take() {
                *db.indexes.write() = Arc::new(staged);
            }
            db.statuses.set(self.id, TxStatus::Committed);

            if let Some(log) = &db.log {
                if !self.write_set.is_empty() {
                    result = log.append_batch(&self.write_set).map(|_| ());
                }
            }
        } else {
            db.statuses.set(self.id, TxStatus::Committed);
        }

        db.retire(self.id);
        self.guard = None;
        self.write_set.clear();
        db.stats.record_commit();
        debug!(id = %self.id, writable = self.writable, "transaction committed");
        result
    }

    /// Rolls the transaction back.
    ///
    /// The staged index set is discarded; versions this transaction
    /// authored stay in the item store but are unreachable, and a later
    /// garbage-collection pass removes them.
    ///
    /// # Errors
    ///
    /// `TxClosed` if already finished.
    pub fn rollback(&mut self) -> CoreResult<()> {
        let db = self.db.take().ok_or(CoreError::TxClosed)?;

        self.staged = None;
        self.write_set.clear();
        db.statuses.set(self.id, TxStatus::RolledBack);
        db.retire(self.id);
        self.guard = None;
        db.stats.record_rollback();
        debug!(id = %self.id, writable = self.writable, "transaction rolled back");
        Ok(())
    }

    fn handle(&self) -> CoreResult<Arc<DatabaseInner>> {
        self.db.clone().ok_or(CoreError::TxClosed)
    }

    fn check_writable(&self) -> CoreResult<()> {
        if self.writable {
            Ok(())
        } else {
            Err(CoreError::NotWritable)
        }
    }

    fn next_op(&mut self) -> u64 {
        self.ops += 1;
        self.ops
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.db.is_some() {
            let _ = self.rollback();
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("writable", &self.writable)
            .field("ops", &self.ops)
            .field("open", &self.db.is_some())
            .finish()
    }
}
