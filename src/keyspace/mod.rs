//! Keyspace Module
//!
//! In-memory home of every key the store holds.
//!
//! ## Responsibilities
//! - Hash-map and sorted-set values under string keys
//! - Type checking (a hash command on a sorted set is an error)
//! - Validate a batch before anything is applied, then apply it under a
//!   single write lock so readers never observe half a batch
//! - Produce a snapshot of the whole keyspace for WAL checkpoints
//!
//! ## Data Structure Choice
//! `HashMap<String, Value>` wrapped in a `parking_lot::RwLock`:
//! - Point lookups only; ordering lives inside each sorted set
//! - Many concurrent readers, one writer at a time

mod sorted_set;
mod table;

pub use sorted_set::SortedSet;
pub use table::Keyspace;

use crate::store::Fields;

/// Value stored under a key
#[derive(Debug, Clone)]
pub enum Value {
    /// Field → value map
    Hash(Fields),

    /// Members ordered by score
    SortedSet(SortedSet),
}

impl Value {
    /// Type name used in wrong-type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Hash(_) => "hash",
            Value::SortedSet(_) => "zset",
        }
    }
}
