//! Secondary indexes.
//!
//! An index is a named, ordered view of live versions whose keys match a
//! glob pattern. Ordering comes from a caller-supplied comparator over
//! values - a strict weak order - with ties broken by key order, which
//! restores a total order the backing `BTreeSet` can rely on.
//!
//! Writable transactions stage index changes in a private clone of the
//! whole [`IndexSet`]; commit publishes the clone in one reference swap.

mod set;

pub use set::IndexSet;

use crate::pattern;
use crate::version::Version;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Comparator over two values; returns true if the first sorts before
/// the second. Must implement a strict weak order.
pub type Comparator = Arc<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// A named, ordered secondary view of live versions.
///
/// # Example
///
/// ```rust
/// use versadb_core::Index;
///
/// let by_length = Index::new("by-len", "user:*", |a, b| a.len() < b.len());
/// assert_eq!(by_length.name(), "by-len");
/// ```
pub struct Index {
    name: String,
    pattern: String,
    compare: Comparator,
    entries: BTreeSet<Entry>,
}

impl Index {
    /// Creates an empty index.
    ///
    /// `pattern` filters keys (`*` covers all); `compare` orders values.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        compare: impl Fn(&str, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            compare: Arc::new(compare),
            entries: BTreeSet::new(),
        }
    }

    /// Returns the index name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the key pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if `key` falls under this index's pattern.
    #[must_use]
    pub fn covers(&self, key: &str) -> bool {
        pattern::matches(&self.pattern, key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Visits entries in ascending order as `(key, value)` pairs.
    ///
    /// The visitor returns true to continue, false to stop.
    pub fn ascend(&self, mut visitor: impl FnMut(&str, &str) -> bool) {
        for entry in &self.entries {
            if !visitor(entry.version.key(), entry.version.value()) {
                break;
            }
        }
    }

    pub(crate) fn insert(&mut self, version: &Arc<Version>) {
        self.entries.replace(self.entry(version));
    }

    pub(crate) fn remove(&mut self, version: &Arc<Version>) {
        self.entries.remove(&self.entry(version));
    }

    fn entry(&self, version: &Arc<Version>) -> Entry {
        Entry {
            version: Arc::clone(version),
            compare: Arc::clone(&self.compare),
        }
    }
}

impl Clone for Index {
    /// Clones the index into a structurally independent tree.
    ///
    /// Entries share the underlying `Arc<Version>` leaves; mutating
    /// either copy never affects the other.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            pattern: self.pattern.clone(),
            compare: Arc::clone(&self.compare),
            entries: self.entries.clone(),
        }
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// An index entry: a version reference carrying its index's comparator
/// so the `BTreeSet` ordering can consult it.
#[derive(Clone)]
struct Entry {
    version: Arc<Version>,
    compare: Comparator,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        if (self.compare)(self.version.value(), other.version.value()) {
            return Ordering::Less;
        }
        if (self.compare)(other.version.value(), self.version.value()) {
            return Ordering::Greater;
        }
        self.version.key().cmp(other.version.key())
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionId;

    fn version(key: &str, value: &str) -> Arc<Version> {
        Arc::new(Version::new(key, value, TransactionId::new(1), 1))
    }

    fn collect_keys(index: &Index) -> Vec<String> {
        let mut keys = Vec::new();
        index.ascend(|key, _| {
            keys.push(key.to_string());
            true
        });
        keys
    }

    #[test]
    fn orders_by_comparator() {
        let mut index = Index::new("len", "*", |a: &str, b: &str| a.len() < b.len());
        for (key, value) in [("1", "abcde"), ("2", "ab"), ("3", "abc"), ("4", "a"), ("5", "abcd")] {
            index.insert(&version(key, value));
        }

        assert_eq!(collect_keys(&index), ["4", "2", "3", "5", "1"]);
    }

    #[test]
    fn ties_break_by_key() {
        let mut index = Index::new("len", "*", |a: &str, b: &str| a.len() < b.len());
        index.insert(&version("b", "xx"));
        index.insert(&version("a", "yy"));
        index.insert(&version("c", "zz"));

        assert_eq!(collect_keys(&index), ["a", "b", "c"]);
    }

    #[test]
    fn remove_uses_value_and_key_identity() {
        let mut index = Index::new("len", "*", |a: &str, b: &str| a.len() < b.len());
        let v = version("a", "hello");
        index.insert(&v);
        index.insert(&version("b", "world"));

        index.remove(&v);
        assert_eq!(collect_keys(&index), ["b"]);
    }

    #[test]
    fn reinsert_same_key_replaces() {
        let mut index = Index::new("len", "*", |a: &str, b: &str| a.len() < b.len());
        index.insert(&version("a", "xx"));
        index.insert(&version("a", "xx"));

        assert_eq!(index.len(), 1);
    }

    #[test]
    fn visitor_can_stop_early() {
        let mut index = Index::new("len", "*", |a: &str, b: &str| a.len() < b.len());
        index.insert(&version("a", "x"));
        index.insert(&version("b", "xx"));
        index.insert(&version("c", "xxx"));

        let mut seen = 0;
        index.ascend(|_, _| {
            seen += 1;
            seen < 2
        });
        assert_eq!(seen, 2);
    }

    #[test]
    fn covers_respects_pattern() {
        let index = Index::new("t", "*.test", |a: &str, b: &str| a < b);
        assert!(index.covers("1.test"));
        assert!(!index.covers("nope"));
    }

    #[test]
    fn clone_is_independent() {
        let mut index = Index::new("len", "*", |a: &str, b: &str| a.len() < b.len());
        index.insert(&version("a", "first"));

        let mut copy = index.clone();
        copy.insert(&version("b", "second!"));

        assert_eq!(index.len(), 1);
        assert_eq!(copy.len(), 2);
    }
}
