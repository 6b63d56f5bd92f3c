//! Command definitions
//!
//! Represents commands from clients.

use crate::store::StoreOp;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    HSet = 0x01,
    HGetAll = 0x02,
    Del = 0x03,
    ZAdd = 0x04,
    ZRem = 0x05,
    ZCard = 0x06,
    ZRange = 0x07,
    Batch = 0x08,
    Ping = 0x09,
}

impl CommandType {
    /// Parse a command type byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::HSet),
            0x02 => Some(CommandType::HGetAll),
            0x03 => Some(CommandType::Del),
            0x04 => Some(CommandType::ZAdd),
            0x05 => Some(CommandType::ZRem),
            0x06 => Some(CommandType::ZCard),
            0x07 => Some(CommandType::ZRange),
            0x08 => Some(CommandType::Batch),
            0x09 => Some(CommandType::Ping),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set fields on a hash-map
    HSet {
        key: String,
        fields: Vec<(String, String)>,
    },

    /// Get every field of a hash-map
    HGetAll { key: String },

    /// Delete a key
    Del { key: String },

    /// Add or re-score a sorted set member
    ZAdd {
        key: String,
        score: f64,
        member: String,
    },

    /// Remove a sorted set member
    ZRem { key: String, member: String },

    /// Sorted set cardinality
    ZCard { key: String },

    /// Sorted set members by rank, inclusive
    ZRange { key: String, start: i64, stop: i64 },

    /// Several mutations applied atomically
    Batch { ops: Vec<StoreOp> },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::HSet { .. } => CommandType::HSet,
            Command::HGetAll { .. } => CommandType::HGetAll,
            Command::Del { .. } => CommandType::Del,
            Command::ZAdd { .. } => CommandType::ZAdd,
            Command::ZRem { .. } => CommandType::ZRem,
            Command::ZCard { .. } => CommandType::ZCard,
            Command::ZRange { .. } => CommandType::ZRange,
            Command::Batch { .. } => CommandType::Batch,
            Command::Ping => CommandType::Ping,
        }
    }
}
