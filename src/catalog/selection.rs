//! Index selection
//!
//! [`Catalog::search`] resolves which index a listing reads and returns it
//! as an immutable [`Selection`]. Nothing about the choice is stored on the
//! catalog, so concurrent callers cannot disturb each other's reads.

use super::record::Record;
use super::storage::Catalog;
use crate::error::Result;
use crate::store::KvStore;

/// Index a selection reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexTarget {
    /// The sequence index: every record, ascending rank
    Sequence,

    /// A field index: records whose `field` equals `value`, unordered
    Field { field: String, value: String },
}

/// A chosen index, ready to be listed
pub struct Selection<'a, S: KvStore> {
    catalog: &'a Catalog<S>,
    target: IndexTarget,
    key: String,
}

impl<'a, S: KvStore> Selection<'a, S> {
    pub(crate) fn new(catalog: &'a Catalog<S>, target: IndexTarget, key: String) -> Self {
        Self {
            catalog,
            target,
            key,
        }
    }

    pub fn target(&self) -> &IndexTarget {
        &self.target
    }

    /// Store key of the selected index
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Every record in the selected index, in index order
    pub fn all(&self) -> Result<Vec<Record>> {
        let ids = self.ids(0, -1)?;
        self.catalog.retrieve_collection(&ids)
    }

    /// Records in the closed rank range `[offset, offset + limit]`
    ///
    /// The upper bound is inclusive: `take(2, 0)` returns up to three
    /// records (ranks 0, 1 and 2), fewer at the end of the index. Entries
    /// whose record hash-map is gone are skipped rather than returned empty,
    /// which can also shorten the page.
    pub fn take(&self, limit: u64, offset: u64) -> Result<Vec<Record>> {
        let (start, stop) = closed_range(limit, offset);
        let ids = self.ids(start, stop)?;
        self.catalog.retrieve_collection(&ids)
    }

    /// Identifiers in rank range `start..=stop`
    pub fn ids(&self, start: i64, stop: i64) -> Result<Vec<String>> {
        self.catalog.store().zrange(&self.key, start, stop)
    }
}

/// Store range for `take(limit, offset)`: `[offset, offset + limit]`
pub fn closed_range(limit: u64, offset: u64) -> (i64, i64) {
    let start = i64::try_from(offset).unwrap_or(i64::MAX);
    let stop = i64::try_from(offset.saturating_add(limit)).unwrap_or(i64::MAX);
    (start, stop)
}
