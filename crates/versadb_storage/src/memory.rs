//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};

/// A storage backend that keeps all bytes in a heap buffer.
///
/// Suitable for unit tests, ephemeral databases, and recovery simulations
/// (pre-load bytes with [`InMemoryBackend::with_data`], then replay).
///
/// # Example
///
/// ```rust
/// use versadb_storage::{StorageBackend, InMemoryBackend};
///
/// let mut backend = InMemoryBackend::new();
/// let offset = backend.append(b"test data").unwrap();
/// assert_eq!(offset, 0);
/// assert_eq!(backend.len().unwrap(), 9);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: Vec<u8>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend pre-loaded with bytes, for replay tests.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&mut self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = self.data.len() as u64;
        let start = offset as usize;
        let end = start.saturating_add(len);

        if offset > size || end > self.data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(self.data[start..end].to_vec())
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_len: u64) -> StorageResult<()> {
        let size = self.data.len() as u64;
        if new_len > size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot truncate {size} bytes to {new_len}"),
            )));
        }
        self.data.truncate(new_len as usize);
        Ok(())
    }

    fn len(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_empty() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty().unwrap());
    }

    #[test]
    fn append_returns_offsets() {
        let mut backend = InMemoryBackend::new();

        assert_eq!(backend.append(b"hello").unwrap(), 0);
        assert_eq!(backend.append(b" world").unwrap(), 5);
        assert_eq!(backend.len().unwrap(), 11);
    }

    #[test]
    fn read_at_returns_written_bytes() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello world").unwrap();

        assert_eq!(backend.read_at(0, 5).unwrap(), b"hello");
        assert_eq!(backend.read_at(6, 5).unwrap(), b"world");
    }

    #[test]
    fn read_past_end_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();

        assert!(matches!(
            backend.read_at(10, 5),
            Err(StorageError::ReadPastEnd { .. })
        ));
        assert!(matches!(
            backend.read_at(3, 10),
            Err(StorageError::ReadPastEnd { .. })
        ));
    }

    #[test]
    fn with_data_preloads() {
        let mut backend = InMemoryBackend::with_data(b"preloaded".to_vec());
        assert_eq!(backend.len().unwrap(), 9);
        assert_eq!(backend.read_at(0, 9).unwrap(), b"preloaded");
    }

    #[test]
    fn truncate_discards_tail() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello world").unwrap();

        backend.truncate(5).unwrap();
        assert_eq!(backend.len().unwrap(), 5);
        assert_eq!(backend.read_at(0, 5).unwrap(), b"hello");
    }

    #[test]
    fn truncate_beyond_size_fails() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();
        assert!(backend.truncate(100).is_err());
    }

    #[test]
    fn empty_read_is_empty() {
        let mut backend = InMemoryBackend::new();
        backend.append(b"hello").unwrap();
        assert!(backend.read_at(2, 0).unwrap().is_empty());
    }
}
