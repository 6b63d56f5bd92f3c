//! Key encoding for catalog structures.
//!
//! Every key of a collection lives under its `key_storage` prefix:
//!
//! - `{key_storage}:{id}` - Record hash-map
//! - `{key_sequence}` - Sequence index (default `{key_storage}:sequence`)
//! - `{key_storage}:index:{field}:{value}` - Field index

use crate::config::CatalogConfig;

/// Segment separating field indexes from records
pub const INDEX_SEGMENT: &str = "index";

/// Build key for a record hash-map.
///
/// Schema: `{key_storage}:{id}`
#[inline]
pub fn record(config: &CatalogConfig, id: &str) -> String {
    format!("{}:{}", config.key_storage, id)
}

/// Build key for the sequence index.
#[inline]
pub fn sequence(config: &CatalogConfig) -> &str {
    &config.key_sequence
}

/// Build key for a (field, value) index.
///
/// Schema: `{key_storage}:index:{field}:{value}`
#[inline]
pub fn field_index(config: &CatalogConfig, field: &str, value: &str) -> String {
    format!("{}:{}:{}:{}", config.key_storage, INDEX_SEGMENT, field, value)
}
