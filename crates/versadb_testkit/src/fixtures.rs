//! Database fixtures.

use std::path::PathBuf;
use tempfile::TempDir;
use versadb_core::{Config, Database};

/// Runs `f` against a fresh in-memory database.
pub fn with_temp_db<R>(f: impl FnOnce(&Database) -> R) -> R {
    let db = Database::open_in_memory().expect("open in-memory database");
    f(&db)
}

/// Runs `f` against a fresh persistent database backed by a temp file.
///
/// The temp directory lives for the duration of `f`; the database is
/// closed afterwards.
pub fn with_persistent_db<R>(f: impl FnOnce(&Database, &PathBuf) -> R) -> R {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.aof");
    let db = open_persistent(&path);
    let result = f(&db, &path);
    db.close().expect("close database");
    result
}

/// Opens a persistent database at `path` without syncing each commit,
/// which keeps test suites fast.
pub fn open_persistent(path: &std::path::Path) -> Database {
    Database::open_with_config(path, true, Config::new().sync_on_commit(false))
        .expect("open persistent database")
}

/// Commits `entries` as a single writable transaction.
pub fn seed(db: &Database, entries: &[(&str, &str)]) {
    let mut tx = db.begin(true).expect("begin seed transaction");
    for (key, value) in entries {
        tx.set(key, value).expect("seed key");
    }
    tx.commit().expect("commit seed transaction");
}

/// Returns `count` generated `(key, value)` pairs, keys `k0000`-style.
#[must_use]
pub fn sample_entries(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("k{i:04}"), format!("value-{i}")))
        .collect()
}
