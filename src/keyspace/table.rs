//! Keyspace implementation
//!
//! HashMap-based keyspace with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{SortedSet, Value};
use crate::error::{CatalogError, Result};
use crate::store::{Fields, StoreOp};

/// Kind of value a key holds while a batch is being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Hash,
    SortedSet,
}

impl Kind {
    fn of(value: &Value) -> Self {
        match value {
            Value::Hash(_) => Kind::Hash,
            Value::SortedSet(_) => Kind::SortedSet,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Kind::Hash => "hash",
            Kind::SortedSet => "zset",
        }
    }
}

/// All keys of a store instance
pub struct Keyspace {
    data: RwLock<HashMap<String, Value>>,
}

impl Keyspace {
    /// Create a new empty keyspace
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Reads (read lock)
    // =========================================================================

    /// All fields of a hash-map key
    pub fn hgetall(&self, key: &str) -> Result<Fields> {
        match self.data.read().get(key) {
            None => Ok(Fields::new()),
            Some(Value::Hash(fields)) => Ok(fields.clone()),
            Some(other) => Err(wrong_type(key, other.type_name())),
        }
    }

    /// Cardinality of a sorted set
    pub fn zcard(&self, key: &str) -> Result<u64> {
        match self.data.read().get(key) {
            None => Ok(0),
            Some(Value::SortedSet(set)) => Ok(set.len() as u64),
            Some(other) => Err(wrong_type(key, other.type_name())),
        }
    }

    /// Rank range over a sorted set
    pub fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        match self.data.read().get(key) {
            None => Ok(Vec::new()),
            Some(Value::SortedSet(set)) => Ok(set.range(start, stop)),
            Some(other) => Err(wrong_type(key, other.type_name())),
        }
    }

    /// Score of a sorted set member
    pub fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        match self.data.read().get(key) {
            None => Ok(None),
            Some(Value::SortedSet(set)) => Ok(set.score(member)),
            Some(other) => Err(wrong_type(key, other.type_name())),
        }
    }

    /// Whether a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Check that every operation of a batch would succeed, in order
    ///
    /// Type changes made by earlier operations of the same batch (a `Del`
    /// followed by a `ZAdd` on the same key, say) are taken into account.
    pub fn validate(&self, ops: &[StoreOp]) -> Result<()> {
        let data = self.data.read();
        let mut overlay: HashMap<&str, Option<Kind>> = HashMap::new();

        for op in ops {
            let key = op.key();
            let current = match overlay.get(key) {
                Some(kind) => *kind,
                None => data.get(key).map(Kind::of),
            };

            match op {
                StoreOp::HSet { fields, .. } => {
                    if fields.is_empty() {
                        return Err(CatalogError::InvalidArgument(format!(
                            "HSET on '{}' without fields",
                            key
                        )));
                    }
                    if current == Some(Kind::SortedSet) {
                        return Err(wrong_type(key, Kind::SortedSet.type_name()));
                    }
                    overlay.insert(key, Some(Kind::Hash));
                }
                StoreOp::Del { .. } => {
                    overlay.insert(key, None);
                }
                StoreOp::ZAdd { score, .. } => {
                    if score.is_nan() {
                        return Err(CatalogError::InvalidArgument(format!(
                            "ZADD on '{}' with a NaN score",
                            key
                        )));
                    }
                    if current == Some(Kind::Hash) {
                        return Err(wrong_type(key, Kind::Hash.type_name()));
                    }
                    overlay.insert(key, Some(Kind::SortedSet));
                }
                StoreOp::ZRem { .. } => {
                    if current == Some(Kind::Hash) {
                        return Err(wrong_type(key, Kind::Hash.type_name()));
                    }
                }
            }
        }

        Ok(())
    }

    /// Apply a validated batch under one write lock
    ///
    /// Callers run [`Keyspace::validate`] first while holding the store's
    /// writer lock; an operation that still finds the wrong type is skipped
    /// and replies 0.
    pub fn apply(&self, ops: &[StoreOp]) -> Vec<u64> {
        let mut data = self.data.write();
        ops.iter().map(|op| apply_op(&mut data, op)).collect()
    }

    /// Remove every key
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// Operations that rebuild the current contents from an empty keyspace
    pub fn snapshot(&self) -> Vec<StoreOp> {
        let data = self.data.read();
        let mut ops = Vec::new();

        for (key, value) in data.iter() {
            match value {
                Value::Hash(fields) => ops.push(StoreOp::HSet {
                    key: key.clone(),
                    fields: fields
                        .iter()
                        .map(|(f, v)| (f.clone(), v.clone()))
                        .collect(),
                }),
                Value::SortedSet(set) => {
                    for (member, score) in set.iter() {
                        ops.push(StoreOp::ZAdd {
                            key: key.clone(),
                            score,
                            member: member.to_string(),
                        });
                    }
                }
            }
        }

        ops
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_type(key: &str, actual: &'static str) -> CatalogError {
    CatalogError::WrongType {
        key: key.to_string(),
        actual,
    }
}

fn apply_op(data: &mut HashMap<String, Value>, op: &StoreOp) -> u64 {
    match op {
        StoreOp::HSet { key, fields } => {
            let value = data
                .entry(key.clone())
                .or_insert_with(|| Value::Hash(Fields::new()));
            let Value::Hash(hash) = value else {
                return 0;
            };
            let mut created = 0;
            for (field, v) in fields {
                if hash.insert(field.clone(), v.clone()).is_none() {
                    created += 1;
                }
            }
            created
        }
        StoreOp::Del { key } => data.remove(key).is_some() as u64,
        StoreOp::ZAdd { key, score, member } => {
            let value = data
                .entry(key.clone())
                .or_insert_with(|| Value::SortedSet(SortedSet::new()));
            let Value::SortedSet(set) = value else {
                return 0;
            };
            set.insert(member, *score) as u64
        }
        StoreOp::ZRem { key, member } => {
            let Some(Value::SortedSet(set)) = data.get_mut(key) else {
                return 0;
            };
            let removed = set.remove(member);
            // Empty sets do not linger as keys
            if set.is_empty() {
                data.remove(key);
            }
            removed as u64
        }
    }
}
