//! Records
//!
//! A record is a flat field → string mapping. Typed values are normalized to
//! strings when set, so what is persisted is exactly what is read back.

use std::collections::btree_map;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use super::identifier::{check_id, derive_id};
use crate::error::{CatalogError, Result};
use crate::store::Fields;

/// Field holding the record identifier
pub const ID_FIELD: &str = "id";

/// Field holding an explicit sequence rank
pub const RANK_FIELD: &str = "rank";

/// Field identifiers are derived from when none is supplied
pub const NAME_FIELD: &str = "name";

/// Canonical timestamp format: ISO 8601 with a numeric offset
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Scalar accepted as a field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Storage form of the value
    pub fn into_storage_string(self) -> String {
        match self {
            FieldValue::Text(s) => s,
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Boolean(b) => if b { "1" } else { "0" }.to_string(),
            FieldValue::Timestamp(ts) => format_timestamp(&ts),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::Text(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(n as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(n as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(ts)
    }
}

/// Render a timestamp in the canonical format, in UTC
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp in the canonical format, RFC 3339, or a naive
/// `YYYY-MM-DD HH:MM:SS` taken as UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::<FixedOffset>::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    Err(CatalogError::InvalidTimestamp(s.to_string()))
}

/// Flat field-name → value mapping for one catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Fields,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Record::set`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, normalizing the value to its storage form
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields
            .insert(field.into(), value.into().into_storage_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.fields.remove(field)
    }

    /// Identifier, if assigned
    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD).filter(|id| !id.is_empty())
    }

    /// Explicit rank, if the record carries one
    pub fn rank(&self) -> Result<Option<f64>> {
        match self.get(RANK_FIELD) {
            None => Ok(None),
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(rank) if rank.is_finite() => Ok(Some(rank)),
                _ => Err(CatalogError::InvalidRank(raw.to_string())),
            },
        }
    }

    /// Assign an identifier derived from the name field when none is set
    ///
    /// An existing identifier is never replaced, but it must not contain
    /// `:` or be a reserved key segment.
    pub fn ensure_id(&mut self) -> Result<String> {
        if let Some(id) = self.id() {
            check_id(id)?;
            return Ok(id.to_string());
        }

        let name = self.get(NAME_FIELD).ok_or_else(|| {
            CatalogError::InvalidArgument(format!(
                "record has neither '{}' nor '{}' to identify it",
                ID_FIELD, NAME_FIELD
            ))
        })?;
        let id = derive_id(name);
        self.fields.insert(ID_FIELD.to_string(), id.clone());
        Ok(id)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.fields.iter()
    }

    /// Field/value pairs as sent to the store
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(f, v)| (f.clone(), v.clone()))
            .collect()
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.set(field, value);
        }
        record
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in &self.fields {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}={:?}", field, value)?;
            first = false;
        }
        Ok(())
    }
}
