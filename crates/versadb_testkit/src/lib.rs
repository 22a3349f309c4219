//! # VersaDB Testkit
//!
//! Test utilities for VersaDB.
//!
//! This crate provides:
//! - Temp-database fixtures for unit and integration tests
//! - Property-based generators using proptest
//! - A reference model for checking engine behavior against
//!
//! ## Usage
//!
//! ```rust
//! use versadb_testkit::prelude::*;
//!
//! with_temp_db(|db| {
//!     let mut tx = db.begin(true).unwrap();
//!     tx.set("k", "v").unwrap();
//!     tx.commit().unwrap();
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
