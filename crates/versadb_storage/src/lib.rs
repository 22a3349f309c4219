//! # VersaDB Storage
//!
//! Storage backend trait and implementations for VersaDB.
//!
//! This crate provides the lowest-level storage abstraction for VersaDB.
//! Storage backends are **opaque byte stores** - they do not interpret
//! the data they store.
//!
//! ## Design Principles
//!
//! - Backends are simple byte stores (read, append, flush)
//! - No knowledge of VersaDB record framing or log layout
//! - Must be `Send + Sync` for concurrent access
//! - VersaDB owns all format interpretation
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use versadb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! let offset = backend.append(b"hello world").unwrap();
//! let data = backend.read_at(offset, 11).unwrap();
//! assert_eq!(&data, b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
