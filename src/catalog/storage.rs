//! Catalog storage engine
//!
//! Maps records onto store primitives:
//!
//! ```text
//!   persist(record)
//!        │
//!        ├── ZADD  {key_sequence}                 rank   id
//!        ├── HSET  {key_storage}:{id}             fields...
//!        ├── ZREM  {key_storage}:index:{f}:{old}  id      (indexed value changed)
//!        └── ZADD  {key_storage}:index:{f}:{new}  0      id
//! ```
//!
//! Writes of one call go to the store as a single batch. The reads a call
//! makes first (previous record, current count) are separate round trips.

use tracing::{debug, warn};

use super::identifier::check_id;
use super::keys;
use super::record::Record;
use super::selection::{IndexTarget, Selection};
use crate::config::{CatalogConfig, CatalogOptions};
use crate::error::Result;
use crate::store::{KvStore, StoreOp};

/// Catalog of records over a [`KvStore`]
///
/// All operations take `&self`; share one catalog across threads or build
/// one per request, both are fine.
pub struct Catalog<S: KvStore> {
    store: S,
    config: CatalogConfig,
}

impl<S: KvStore> Catalog<S> {
    /// Create a catalog; `key_storage` is required
    pub fn new(store: S, options: CatalogOptions) -> Result<Self> {
        let config = CatalogConfig::from_options(options)?;
        debug!(
            "Catalog '{}' ready (sequence '{}', indexed fields {:?})",
            config.key_storage, config.key_sequence, config.fields
        );
        Ok(Self { store, config })
    }

    /// Merge options into the configuration
    ///
    /// Data already written stays where it is; changing prefixes only
    /// changes which keys later calls address.
    pub fn configure(&mut self, options: CatalogOptions) -> Result<()> {
        self.config.merge(options)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create or overwrite a record, returning its identifier
    ///
    /// - A record without `id` gets one derived from `name`
    /// - Rank is the record's `rank` field, else the current count
    ///   (so re-persisting without a rank moves the record to the end)
    /// - Fields the previous version had but this one lacks are dropped
    /// - Field index entries for changed indexed values are moved
    pub fn persist(&self, record: &Record) -> Result<String> {
        let mut record = record.clone();
        let id = record.ensure_id()?;

        let previous = self.retrieve(&id)?;
        let rank = match record.rank()? {
            Some(rank) => rank,
            None => self.count()? as f64,
        };

        let record_key = keys::record(&self.config, &id);
        let mut ops = vec![StoreOp::ZAdd {
            key: keys::sequence(&self.config).to_string(),
            score: rank,
            member: id.clone(),
        }];

        if !previous.is_empty() {
            ops.push(StoreOp::Del {
                key: record_key.clone(),
            });
        }
        ops.push(StoreOp::HSet {
            key: record_key,
            fields: record.to_pairs(),
        });

        for field in &self.config.fields {
            let new_value = record.get(field);
            if let Some(old_value) = previous.get(field) {
                if new_value != Some(old_value) {
                    ops.push(StoreOp::ZRem {
                        key: keys::field_index(&self.config, field, old_value),
                        member: id.clone(),
                    });
                }
            }
            if let Some(new_value) = new_value {
                ops.push(StoreOp::ZAdd {
                    key: keys::field_index(&self.config, field, new_value),
                    score: 0.0,
                    member: id.clone(),
                });
            }
        }

        self.store.batch(&ops)?;
        debug!("Persisted '{}' at rank {} ({} ops)", id, rank, ops.len());

        Ok(id)
    }

    /// Full record for `id`, empty when there is none
    ///
    /// An identifier no record could have (see [`check_id`]) is never looked
    /// up and yields an empty record.
    pub fn retrieve(&self, id: &str) -> Result<Record> {
        if check_id(id).is_err() {
            return Ok(Record::new());
        }
        let fields = self.store.hgetall(&keys::record(&self.config, id))?;
        Ok(Record::from(fields))
    }

    /// Remove a record from every structure
    ///
    /// Returns true only if both the sequence entry and the record hash-map
    /// were removed. Unknown identifiers return false and change nothing.
    pub fn delete(&self, id: &str) -> Result<bool> {
        if check_id(id).is_err() {
            debug!("Not deleting '{}': not a record identifier", id);
            return Ok(false);
        }
        let previous = self.retrieve(id)?;

        let mut ops = vec![
            StoreOp::ZRem {
                key: keys::sequence(&self.config).to_string(),
                member: id.to_string(),
            },
            StoreOp::Del {
                key: keys::record(&self.config, id),
            },
        ];
        for field in &self.config.fields {
            if let Some(value) = previous.get(field) {
                ops.push(StoreOp::ZRem {
                    key: keys::field_index(&self.config, field, value),
                    member: id.to_string(),
                });
            }
        }

        let replies = self.store.batch(&ops)?;
        let unsequenced = replies.first().copied().unwrap_or(0) > 0;
        let removed = replies.get(1).copied().unwrap_or(0) > 0;

        if unsequenced != removed {
            warn!(
                "Partial delete of '{}': sequence entry removed={}, record removed={}",
                id, unsequenced, removed
            );
        } else if removed {
            debug!("Deleted '{}'", id);
        }

        Ok(unsequenced && removed)
    }

    /// Choose the index the next listing reads
    ///
    /// No field, or a field without an index, selects the full sequence.
    /// An indexed field without a value selects the empty-value index.
    pub fn search(&self, field: Option<&str>, value: Option<&str>) -> Selection<'_, S> {
        match field {
            Some(field) if self.config.is_indexed(field) => {
                let value = value.unwrap_or_default();
                let key = keys::field_index(&self.config, field, value);
                Selection::new(
                    self,
                    IndexTarget::Field {
                        field: field.to_string(),
                        value: value.to_string(),
                    },
                    key,
                )
            }
            _ => Selection::new(
                self,
                IndexTarget::Sequence,
                keys::sequence(&self.config).to_string(),
            ),
        }
    }

    /// Every record, ascending rank
    pub fn all(&self) -> Result<Vec<Record>> {
        self.search(None, None).all()
    }

    /// Records ranked `[offset, offset + limit]` (closed range)
    ///
    /// Sequence entries whose record hash-map is gone are skipped, so fewer
    /// than `limit + 1` records can come back even mid-sequence.
    pub fn take(&self, limit: u64, offset: u64) -> Result<Vec<Record>> {
        self.search(None, None).take(limit, offset)
    }

    /// Number of records in the sequence index
    pub fn count(&self) -> Result<u64> {
        self.store.zcard(keys::sequence(&self.config))
    }

    /// Resolve identifiers into records, keeping their order
    ///
    /// Identifiers whose record vanished since the index was read are
    /// skipped.
    pub(crate) fn retrieve_collection(&self, ids: &[String]) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self.retrieve(id)?;
            if record.is_empty() {
                debug!("Skipping '{}': listed but no longer stored", id);
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }
}
