//! Store Module
//!
//! The key-value boundary the catalog is written against.
//!
//! ## Primitives
//! - Hash-maps: `hset` (set multiple fields), `hgetall`
//! - Keys: `del`
//! - Sorted sets: `zadd`, `zrem`, `zcard`, `zrange` (by rank)
//! - `batch`: several mutations submitted together
//!
//! Any store offering these is a valid backend. Two ship with the crate:
//! [`crate::Engine`] (in-process) and [`crate::RemoteStore`] (TCP client).
//! Both apply a batch atomically; the default `batch` implementation runs
//! the operations one after another and stops at the first failure.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Field name → value mapping of one hash-map key
pub type Fields = BTreeMap<String, String>;

/// A single mutation, as logged in the WAL and sent in batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoreOp {
    /// Set fields on a hash-map (existing fields not listed are kept)
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },

    /// Delete a key of any type
    Del { key: String },

    /// Add or re-score a sorted set member
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },

    /// Remove a sorted set member
    ZRem { key: String, member: String },
}

impl StoreOp {
    /// Key touched by this operation
    pub fn key(&self) -> &str {
        match self {
            StoreOp::HSet { key, .. }
            | StoreOp::Del { key }
            | StoreOp::ZAdd { key, .. }
            | StoreOp::ZRem { key, .. } => key,
        }
    }
}

/// Hash-map and sorted-set key-value store
///
/// Integer replies follow the usual conventions: `hset` returns the number
/// of fields that were newly created, `zadd` reports whether the member is
/// new, `del`/`zrem` report whether anything was removed.
pub trait KvStore: Send + Sync {
    /// Set multiple fields on a hash-map key
    fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64>;

    /// Get all fields of a hash-map key (empty if the key does not exist)
    fn hgetall(&self, key: &str) -> Result<Fields>;

    /// Delete a key
    fn del(&self, key: &str) -> Result<bool>;

    /// Add a member with a score, or update the score of an existing member
    fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool>;

    /// Remove a member from a sorted set
    fn zrem(&self, key: &str, member: &str) -> Result<bool>;

    /// Number of members in a sorted set
    fn zcard(&self, key: &str) -> Result<u64>;

    /// Members ranked `start..=stop` in ascending (score, member) order
    ///
    /// Negative indexes count from the end, `-1` being the last member.
    fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Apply several mutations, returning one integer reply per operation
    fn batch(&self, ops: &[StoreOp]) -> Result<Vec<u64>> {
        let mut replies = Vec::with_capacity(ops.len());
        for op in ops {
            let reply = match op {
                StoreOp::HSet { key, fields } => self.hset(key, fields)?,
                StoreOp::Del { key } => self.del(key)? as u64,
                StoreOp::ZAdd { key, score, member } => self.zadd(key, *score, member)? as u64,
                StoreOp::ZRem { key, member } => self.zrem(key, member)? as u64,
            };
            replies.push(reply);
        }
        Ok(replies)
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64> {
        (**self).hset(key, fields)
    }

    fn hgetall(&self, key: &str) -> Result<Fields> {
        (**self).hgetall(key)
    }

    fn del(&self, key: &str) -> Result<bool> {
        (**self).del(key)
    }

    fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        (**self).zadd(key, score, member)
    }

    fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        (**self).zrem(key, member)
    }

    fn zcard(&self, key: &str) -> Result<u64> {
        (**self).zcard(key)
    }

    fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        (**self).zrange(key, start, stop)
    }

    fn batch(&self, ops: &[StoreOp]) -> Result<Vec<u64>> {
        (**self).batch(ops)
    }
}
