//! Append-only durability log.
//!
//! The log is a flat file of framed record batches: each commit appends
//! one outer array whose elements are SET and DEL records in the order
//! the transaction produced them. There is no global header and no
//! checksum; the framing is length-prefixed, so a tail torn by a crash is
//! detectable and discarded on replay. Everything before the first
//! framing error is the durable state.
//!
//! Commit publishes in memory before appending here; an append failure is
//! reported to the caller after the publish has already happened. Callers
//! needing crash-ordering stronger than "records appended in commit
//! order" must layer it on top.

mod record;

pub use record::LogRecord;

use crate::error::CoreResult;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use versadb_codec::{Decoder, Encoder, Value};
use versadb_storage::{StorageBackend, StorageError};

/// Summary of a replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Committed batches applied.
    pub batches: usize,
    /// Records applied across all batches.
    pub records: usize,
    /// True if replay stopped before the end of the file.
    pub truncated: bool,
}

/// The append-only log manager.
///
/// Wraps a [`StorageBackend`] behind a mutex; all appends are serialized
/// by the database-wide writer mutex above this layer anyway, the lock
/// here just keeps `close` safe against a racing commit.
pub struct Aof {
    backend: Mutex<Option<Box<dyn StorageBackend>>>,
    sync_on_commit: bool,
}

impl Aof {
    /// Creates a log over `backend`.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_commit: bool) -> Self {
        Self {
            backend: Mutex::new(Some(backend)),
            sync_on_commit,
        }
    }

    /// Appends `records` as a single framed batch.
    ///
    /// Returns the offset the batch was written at.
    ///
    /// # Errors
    ///
    /// Fails if the log is closed or the backend write fails.
    pub fn append_batch(&self, records: &[LogRecord]) -> CoreResult<u64> {
        let mut encoder = Encoder::new();
        encoder.encode(&Value::Array(
            records.iter().map(LogRecord::to_value).collect(),
        ));

        let mut guard = self.backend.lock();
        let backend = guard.as_mut().ok_or(StorageError::Closed)?;
        let offset = backend.append(encoder.as_bytes())?;
        backend.flush()?;
        if self.sync_on_commit {
            backend.sync()?;
        }

        trace!(records = records.len(), offset, "appended log batch");
        Ok(offset)
    }

    /// Replays every durable record in order through `apply`.
    ///
    /// Replay ends at the first framing error; the records already
    /// applied form the durable prefix. A clean truncation (torn final
    /// write) is expected after a crash and logged at debug level;
    /// structural corruption is logged at warn level. Neither aborts the
    /// open.
    ///
    /// # Errors
    ///
    /// Fails only if the backend cannot be read or `apply` fails.
    pub fn replay(
        &self,
        mut apply: impl FnMut(LogRecord) -> CoreResult<()>,
    ) -> CoreResult<ReplaySummary> {
        let mut guard = self.backend.lock();
        let backend = guard.as_mut().ok_or(StorageError::Closed)?;

        let len = backend.len()?;
        let data = backend.read_at(0, len as usize)?;
        let mut decoder = Decoder::new(&data);
        let mut summary = ReplaySummary::default();

        'batches: while !decoder.is_empty() {
            let batch = match decoder.decode() {
                Ok(batch) => batch,
                Err(err) if err.is_truncation() => {
                    debug!(offset = decoder.position(), "discarding torn log tail");
                    summary.truncated = true;
                    break;
                }
                Err(err) => {
                    warn!(
                        offset = decoder.position(),
                        error = %err,
                        "log damaged; keeping prefix"
                    );
                    summary.truncated = true;
                    break;
                }
            };

            let Some(items) = batch.as_array() else {
                warn!(offset = decoder.position(), "log batch is not an array; keeping prefix");
                summary.truncated = true;
                break;
            };

            for item in items {
                let Some(record) = LogRecord::from_value(item) else {
                    warn!(offset = decoder.position(), "malformed log record; keeping prefix");
                    summary.truncated = true;
                    break 'batches;
                };
                apply(record)?;
                summary.records += 1;
            }
            summary.batches += 1;
        }

        debug!(
            batches = summary.batches,
            records = summary.records,
            truncated = summary.truncated,
            "log replay finished"
        );
        Ok(summary)
    }

    /// Flushes, syncs, and closes the log. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails if the final flush or sync fails; the log is closed either
    /// way.
    pub fn close(&self) -> CoreResult<()> {
        let Some(mut backend) = self.backend.lock().take() else {
            return Ok(());
        };
        backend.flush()?;
        backend.sync()?;
        Ok(())
    }

    /// Returns true if the log has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.backend.lock().is_none()
    }
}

impl std::fmt::Debug for Aof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aof")
            .field("sync_on_commit", &self.sync_on_commit)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionId;
    use versadb_storage::InMemoryBackend;

    fn create_log() -> Aof {
        Aof::new(Box::new(InMemoryBackend::new()), false)
    }

    fn replay_all(log: &Aof) -> (Vec<LogRecord>, ReplaySummary) {
        let mut records = Vec::new();
        let summary = log
            .replay(|record| {
                records.push(record);
                Ok(())
            })
            .unwrap();
        (records, summary)
    }

    #[test]
    fn empty_log_replays_nothing() {
        let log = create_log();
        let (records, summary) = replay_all(&log);
        assert!(records.is_empty());
        assert!(!summary.truncated);
    }

    #[test]
    fn batches_replay_in_append_order() {
        let log = create_log();
        let tx = TransactionId::new(1);
        log.append_batch(&[LogRecord::set("a", "1", tx)]).unwrap();
        log.append_batch(&[LogRecord::del("a"), LogRecord::set("b", "2", tx)])
            .unwrap();

        let (records, summary) = replay_all(&log);
        assert_eq!(
            records,
            [
                LogRecord::set("a", "1", tx),
                LogRecord::del("a"),
                LogRecord::set("b", "2", tx),
            ]
        );
        assert_eq!(summary.batches, 2);
        assert_eq!(summary.records, 3);
        assert!(!summary.truncated);
    }

    #[test]
    fn torn_tail_keeps_prefix() {
        fn batch_bytes(record: LogRecord) -> Vec<u8> {
            let mut encoder = Encoder::new();
            encoder.encode(&Value::Array(vec![record.to_value()]));
            encoder.into_bytes()
        }

        // A full first batch followed by half of a second one.
        let mut bytes = batch_bytes(LogRecord::set("a", "1", TransactionId::new(1)));
        let second = batch_bytes(LogRecord::set("b", "2", TransactionId::new(2)));
        bytes.extend_from_slice(&second[..second.len() / 2]);

        let log = Aof::new(Box::new(InMemoryBackend::with_data(bytes)), false);
        let (records, summary) = replay_all(&log);

        assert_eq!(records, [LogRecord::set("a", "1", TransactionId::new(1))]);
        assert!(summary.truncated);
        assert_eq!(summary.batches, 1);
    }

    #[test]
    fn garbage_tail_keeps_prefix() {
        let mut encoder = Encoder::new();
        encoder.encode(&Value::Array(vec![
            LogRecord::set("a", "1", TransactionId::new(1)).to_value()
        ]));
        let mut bytes = encoder.into_bytes();
        bytes.extend_from_slice(b"%%%garbage%%%");

        let log = Aof::new(Box::new(InMemoryBackend::with_data(bytes)), false);
        let (records, summary) = replay_all(&log);

        assert_eq!(records.len(), 1);
        assert!(summary.truncated);
    }

    #[test]
    fn close_is_idempotent() {
        let log = create_log();
        log.close().unwrap();
        log.close().unwrap();
        assert!(log.is_closed());
    }

    #[test]
    fn append_after_close_fails() {
        let log = create_log();
        log.close().unwrap();
        let err = log
            .append_batch(&[LogRecord::del("k")])
            .unwrap_err();
        assert!(matches!(
            err,
            crate::CoreError::Storage(StorageError::Closed)
        ));
    }
}
