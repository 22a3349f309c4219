//! Named collection of indexes.

use crate::error::{CoreError, CoreResult};
use crate::index::Index;
use crate::version::Version;
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from name to [`Index`], cloneable as a unit.
///
/// The database publishes one `IndexSet` behind an `Arc`; every writable
/// transaction clones it at begin and the clone is swapped in at commit.
#[derive(Debug, Clone, Default)]
pub struct IndexSet {
    indexes: HashMap<String, Index>,
}

impl IndexSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an index.
    ///
    /// The index keeps whatever entries it already holds; newly created
    /// indexes start empty and are populated by the caller.
    ///
    /// # Errors
    ///
    /// `EmptyIndex` if the name is empty, `IndexExists` if taken.
    pub fn add(&mut self, index: Index) -> CoreResult<()> {
        if index.name().is_empty() {
            return Err(CoreError::EmptyIndex);
        }
        if self.indexes.contains_key(index.name()) {
            return Err(CoreError::IndexExists {
                name: index.name().to_string(),
            });
        }
        self.indexes.insert(index.name().to_string(), index);
        Ok(())
    }

    /// Removes the named index; absent names are not an error.
    ///
    /// # Errors
    ///
    /// `EmptyIndex` if the name is empty.
    pub fn remove(&mut self, name: &str) -> CoreResult<()> {
        if name.is_empty() {
            return Err(CoreError::EmptyIndex);
        }
        self.indexes.remove(name);
        Ok(())
    }

    /// Returns the named index, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name)
    }

    /// Inserts a version into every index whose pattern covers its key.
    ///
    /// With `restrict_to` set, only the index of that name is touched.
    pub fn insert_version(&mut self, version: &Arc<Version>, restrict_to: Option<&str>) {
        for index in self.matching_mut(version.key(), restrict_to) {
            index.insert(version);
        }
    }

    /// Removes a version from every index whose pattern covers its key.
    ///
    /// With `restrict_to` set, only the index of that name is touched.
    pub fn remove_version(&mut self, version: &Arc<Version>, restrict_to: Option<&str>) {
        for index in self.matching_mut(version.key(), restrict_to) {
            index.remove(version);
        }
    }

    /// Returns the number of indexes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Returns true if the set holds no indexes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Returns the index names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    fn matching_mut<'a>(
        &'a mut self,
        key: &'a str,
        restrict_to: Option<&'a str>,
    ) -> impl Iterator<Item = &'a mut Index> {
        self.indexes.values_mut().filter(move |index| {
            restrict_to.map_or(true, |name| name == index.name()) && index.covers(key)
        })
    }
}
