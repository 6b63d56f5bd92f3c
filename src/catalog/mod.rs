//! Catalog Module
//!
//! Versioned repository and package records over a hash-map / sorted-set
//! store.
//!
//! ## Structures (per collection)
//! - Record hash-maps: one per identifier, the record's fields
//! - Sequence index: sorted set id → rank, global listing order and count
//! - Field indexes: one sorted set per (field, value) of an indexed field,
//!   every score 0, for equality search
//!
//! ## Reading
//! ```text
//! catalog.search(Some("name"), Some("foo")).all()
//! catalog.search(None, None).take(10, 20)      // ranks 20..=30
//! ```

mod entity;
mod identifier;
pub mod keys;
mod record;
mod selection;
mod storage;

pub use entity::{Entity, Package, Repository};
pub use identifier::{check_id, derive_id, ID_LENGTH};
pub use record::{
    format_timestamp, parse_timestamp, FieldValue, Record, ID_FIELD, NAME_FIELD, RANK_FIELD,
    TIMESTAMP_FORMAT,
};
pub use selection::{closed_range, IndexTarget, Selection};
pub use storage::Catalog;
