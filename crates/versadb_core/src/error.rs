//! Error types for the engine.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the engine.
///
/// The first seven variants are contract errors: the transaction remains
/// usable after receiving one. `OpenFile`, `Storage`, and `Codec` are
/// durability errors; a commit that returns one has already published its
/// changes in memory (see [`crate::aof`]).
#[derive(Debug, Error)]
pub enum CoreError {
    /// The key does not exist, was deleted, or is not yet visible.
    #[error("not found")]
    NotFound,

    /// A `set` targeted a key that is already visible.
    #[error("already exists")]
    AlreadyExists,

    /// The transaction has been committed or rolled back.
    #[error("transaction closed")]
    TxClosed,

    /// A mutating operation was attempted on a read-only transaction.
    #[error("transaction is not writable")]
    NotWritable,

    /// An index name was empty.
    #[error("index name is empty")]
    EmptyIndex,

    /// An index with this name already exists.
    #[error("index already exists: {name}")]
    IndexExists {
        /// The conflicting name.
        name: String,
    },

    /// No index with this name exists.
    #[error("unknown index: {name}")]
    UnknownIndex {
        /// The requested name.
        name: String,
    },

    /// The durability log file could not be opened.
    #[error("opening file {}: {source}", .path.display())]
    OpenFile {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(#[from] versadb_storage::StorageError),

    /// Log record framing failure.
    #[error("codec error: {0}")]
    Codec(#[from] versadb_codec::CodecError),
}
