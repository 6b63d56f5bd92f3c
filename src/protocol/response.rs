//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};
use crate::store::Fields;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

/// Result of a successfully executed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// HSET, DEL, ZADD, ZREM, ZCARD
    Integer(u64),

    /// HGETALL
    Fields(Fields),

    /// ZRANGE
    Members(Vec<String>),

    /// BATCH: one integer per operation
    Integers(Vec<u64>),

    /// PING
    Pong,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (encoded reply for OK, message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response carrying an encoded reply
    pub fn ok(reply: &Reply) -> Result<Self> {
        Ok(Self {
            status: Status::Ok,
            payload: Some(bincode::serialize(reply)?),
        })
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Turn the response back into a reply, or the server's error
    pub fn into_reply(self) -> Result<Reply> {
        let payload = self.payload.unwrap_or_default();
        match self.status {
            Status::Ok => Ok(bincode::deserialize(&payload)?),
            Status::Error => Err(CatalogError::Remote(
                String::from_utf8_lossy(&payload).into_owned(),
            )),
        }
    }
}
