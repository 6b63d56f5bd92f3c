//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type (bincode)
//! - HSET:    (key, [(field, value)])
//! - HGETALL: key
//! - DEL:     key
//! - ZADD:    (key, score, member)
//! - ZREM:    (key, member)
//! - ZCARD:   key
//! - ZRANGE:  (key, start, stop)
//! - BATCH:   [op]
//! - PING:    empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use serde::de::DeserializeOwned;

use super::{Command, CommandType, Response, Status};
use crate::error::{CatalogError, Result};
use crate::store::StoreOp;

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let cmd_type = command.command_type() as u8;

    let payload = match command {
        Command::HSet { key, fields } => bincode::serialize(&(key, fields))?,
        Command::HGetAll { key } | Command::Del { key } | Command::ZCard { key } => {
            bincode::serialize(key)?
        }
        Command::ZAdd { key, score, member } => bincode::serialize(&(key, score, member))?,
        Command::ZRem { key, member } => bincode::serialize(&(key, member))?,
        Command::ZRange { key, start, stop } => bincode::serialize(&(key, start, stop))?,
        Command::Batch { ops } => bincode::serialize(ops)?,
        Command::Ping => Vec::new(),
    };

    Ok(frame(cmd_type, &payload))
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    let cmd_type = CommandType::from_byte(cmd_type).ok_or_else(|| {
        CatalogError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_type))
    })?;

    let command = match cmd_type {
        CommandType::HSet => {
            let (key, fields) = decode_payload::<(String, Vec<(String, String)>)>(payload, "HSET")?;
            Command::HSet { key, fields }
        }
        CommandType::HGetAll => Command::HGetAll {
            key: decode_payload(payload, "HGETALL")?,
        },
        CommandType::Del => Command::Del {
            key: decode_payload(payload, "DEL")?,
        },
        CommandType::ZAdd => {
            let (key, score, member) = decode_payload::<(String, f64, String)>(payload, "ZADD")?;
            Command::ZAdd { key, score, member }
        }
        CommandType::ZRem => {
            let (key, member) = decode_payload::<(String, String)>(payload, "ZREM")?;
            Command::ZRem { key, member }
        }
        CommandType::ZCard => Command::ZCard {
            key: decode_payload(payload, "ZCARD")?,
        },
        CommandType::ZRange => {
            let (key, start, stop) = decode_payload::<(String, i64, i64)>(payload, "ZRANGE")?;
            Command::ZRange { key, start, stop }
        }
        CommandType::Batch => Command::Batch {
            ops: decode_payload::<Vec<StoreOp>>(payload, "BATCH")?,
        },
        CommandType::Ping => {
            if !payload.is_empty() {
                return Err(CatalogError::Protocol(format!(
                    "PING command: unexpected payload of {} bytes",
                    payload.len()
                )));
            }
            Command::Ping
        }
    };

    Ok(command)
}

/// Deserialize a command payload, reporting failures as protocol errors
fn decode_payload<T: DeserializeOwned>(payload: &[u8], name: &str) -> Result<T> {
    bincode::deserialize(payload)
        .map_err(|e| CatalogError::Protocol(format!("{} command: malformed payload: {}", name, e)))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    frame(response.status as u8, payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::Error,
        _ => {
            return Err(CatalogError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing
// =============================================================================

fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(kind);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Split a complete message into its type byte and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(CatalogError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() < total_len {
        return Err(CatalogError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: u32, what: &str) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(CatalogError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one framed message (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    check_payload_len(payload_len, what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len as usize];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, "command")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
