//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::store::StoreOp;

/// Header size: LSN (8) + CRC (4) + data length (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on the data section of one entry (64 MB)
pub const MAX_ENTRY_SIZE: u32 = 64 * 1024 * 1024;

/// A single entry in the WAL
///
/// One entry holds every operation of one batch, so replay restores
/// batches whole or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: i64,

    /// Operations applied together
    pub ops: Vec<StoreOp>,
}

impl WalEntry {
    pub fn new(lsn: u64, ops: Vec<StoreOp>) -> Self {
        Self {
            lsn,
            timestamp: chrono::Utc::now().timestamp_millis(),
            ops,
        }
    }

    /// Encode header + data
    pub fn encode(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        if data.len() > MAX_ENTRY_SIZE as usize {
            return Err(CatalogError::WalWrite(format!(
                "entry of {} bytes exceeds the {} byte limit",
                data.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_be_bytes());
        bytes.extend_from_slice(&Self::compute_crc(&data).to_be_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Decode the data section after its header has been read
    pub fn decode(header_lsn: u64, crc: u32, data: &[u8]) -> Result<Self> {
        let actual = Self::compute_crc(data);
        if actual != crc {
            return Err(CatalogError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                header_lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| CatalogError::WalCorruption(format!("undecodable entry: {}", e)))?;

        if entry.lsn != header_lsn {
            return Err(CatalogError::WalCorruption(format!(
                "header LSN {} does not match entry LSN {}",
                header_lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    pub fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
