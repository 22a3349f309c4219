//! Storage backend trait definition.

use crate::error::StorageResult;

/// A low-level append-only byte store.
///
/// Backends know nothing about the record framing layered on top of them;
/// they move bytes and report sizes. The engine serializes access, so
/// mutating operations take `&mut self` and implementations do not need
/// internal locking.
///
/// # Invariants
///
/// - `append` returns the offset the data was written at
/// - `read_at` returns exactly the bytes previously written at that offset
/// - `flush` pushes buffered writes to the OS; `sync` makes them durable
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Fails with `ReadPastEnd` if the requested range extends beyond the
    /// current size, or with an I/O error.
    fn read_at(&mut self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends data at the end of the store and returns the write offset.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Flushes buffered writes to the OS.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs data and metadata to durable storage.
    ///
    /// A stronger guarantee than `flush`: after this returns, appended data
    /// survives process termination.
    fn sync(&mut self) -> StorageResult<()>;

    /// Shrinks the store to `new_len` bytes, discarding everything after.
    ///
    /// # Errors
    ///
    /// Fails if `new_len` exceeds the current size.
    fn truncate(&mut self, new_len: u64) -> StorageResult<()>;

    /// Returns the current size in bytes.
    fn len(&self) -> StorageResult<u64>;

    /// Returns true if the store holds no bytes.
    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}
