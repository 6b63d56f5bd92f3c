//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Framed Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: HSET     - Payload: key + field/value pairs
//! - 0x02: HGETALL  - Payload: key
//! - 0x03: DEL      - Payload: key
//! - 0x04: ZADD     - Payload: key + score + member
//! - 0x05: ZREM     - Payload: key + member
//! - 0x06: ZCARD    - Payload: key
//! - 0x07: ZRANGE   - Payload: key + start + stop
//! - 0x08: BATCH    - Payload: list of mutations
//! - 0x09: PING     - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK    - Payload: bincode-encoded [`Reply`]
//! - 0x01: ERROR - Payload: UTF-8 message

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Reply, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
