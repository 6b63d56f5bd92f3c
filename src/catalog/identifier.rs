//! Identifier derivation
//!
//! A record without an explicit identifier gets one derived from a
//! uniqueness-bearing field. Same input, same identifier: re-creating an
//! entity from the same name lands on the same record.

use sha2::{Digest, Sha256};

use crate::config::SEQUENCE_SUFFIX;
use crate::error::{CatalogError, Result};

/// Length of derived identifiers, in hex characters
pub const ID_LENGTH: usize = 10;

/// Derive a short, stable identifier from `input`
///
/// SHA-256 of the hex SHA-256 of the input, truncated to [`ID_LENGTH`] hex
/// characters.
pub fn derive_id(input: &str) -> String {
    let inner = sha256_hex(input.as_bytes());
    let mut outer = sha256_hex(inner.as_bytes());
    outer.truncate(ID_LENGTH);
    outer
}

/// Check that an explicit identifier cannot address another structure
///
/// Identifiers become the last segment of `{key_storage}:{id}`, so they may
/// not contain `:` (which would reach into field index keys) and may not be
/// the sequence key's own segment.
pub fn check_id(id: &str) -> Result<()> {
    if id.contains(':') {
        return Err(CatalogError::InvalidArgument(format!(
            "identifier '{}' must not contain ':'",
            id
        )));
    }
    if id == SEQUENCE_SUFFIX.trim_start_matches(':') {
        return Err(CatalogError::InvalidArgument(format!(
            "identifier '{}' is reserved",
            id
        )));
    }
    Ok(())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
