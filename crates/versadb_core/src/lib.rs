//! # VersaDB Core
//!
//! An embedded, in-memory key/value store with ACID-style transactions,
//! secondary indexes, and optional append-only durability.
//!
//! The engine keeps every key as a chain of versions stamped with the
//! transactions that created and deleted them. Readers run fully
//! concurrently against those chains under snapshot-style visibility
//! rules; writers serialize on a database-wide mutex and stage their
//! index changes privately until commit publishes them in one swap.
//!
//! ## Example
//!
//! ```rust
//! use versadb_core::{Database, Index};
//!
//! let db = Database::open_in_memory().unwrap();
//!
//! let mut tx = db.begin(true).unwrap();
//! tx.set("user:1", "ada").unwrap();
//! tx.set("user:2", "grace").unwrap();
//! tx.add_index(Index::new("by-len", "user:*", |a, b| a.len() < b.len()))
//!     .unwrap();
//! tx.commit().unwrap();
//!
//! let tx = db.begin(false).unwrap();
//! let mut names = Vec::new();
//! tx.ascend("by-len", |_key, value| {
//!     names.push(value.to_string());
//!     true
//! })
//! .unwrap();
//! assert_eq!(names, ["ada", "grace"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod aof;
mod config;
mod database;
mod error;
pub mod index;
pub mod pattern;
mod stats;
mod status;
mod store;
mod transaction;
mod types;
mod version;

pub use config::Config;
pub use database::{Database, GcReport};
pub use error::{CoreError, CoreResult};
pub use index::{Index, IndexSet};
pub use stats::StatsSnapshot;
pub use status::TxStatus;
pub use transaction::Transaction;
pub use types::TransactionId;
pub use version::Version;
