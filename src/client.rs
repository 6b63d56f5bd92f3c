//! Client Module
//!
//! Blocking TCP client that implements [`KvStore`] against a server.
//!
//! One connection per client; concurrent callers share it through a mutex,
//! so each request/response pair is exchanged whole. Timeouts are the
//! socket's own read/write timeouts and there is no retry layer.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{CatalogError, Result};
use crate::protocol::{read_response, write_command, Command, Reply};
use crate::store::{Fields, KvStore, StoreOp};

struct ClientConnection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

/// Store backed by a remote catalogdb server
pub struct RemoteStore {
    conn: Mutex<ClientConnection>,
    addr: String,
}

impl RemoteStore {
    /// Connect without timeouts
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeouts(addr, 0, 0)
    }

    /// Connect with read/write timeouts in milliseconds (0 = none)
    pub fn connect_with_timeouts(addr: &str, read_ms: u64, write_ms: u64) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| CatalogError::Network(format!("failed to connect to {}: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        if read_ms > 0 {
            stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        let read_stream = stream.try_clone()?;
        tracing::debug!("Connected to {}", addr);

        Ok(Self {
            conn: Mutex::new(ClientConnection {
                reader: BufReader::new(read_stream),
                writer: BufWriter::new(stream),
            }),
            addr: addr.to_string(),
        })
    }

    /// Send a command and wait for its reply
    pub fn call(&self, command: &Command) -> Result<Reply> {
        let mut conn = self.conn.lock();
        write_command(&mut conn.writer, command)?;
        read_response(&mut conn.reader)?.into_reply()
    }

    /// Round-trip a PING
    pub fn ping(&self) -> Result<()> {
        match self.call(&Command::Ping)? {
            Reply::Pong => Ok(()),
            other => Err(unexpected("PING", &other)),
        }
    }

    /// Server address
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn integer(&self, command: Command) -> Result<u64> {
        let name = command_name(&command);
        match self.call(&command)? {
            Reply::Integer(n) => Ok(n),
            other => Err(unexpected(name, &other)),
        }
    }
}

impl KvStore for RemoteStore {
    fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64> {
        self.integer(Command::HSet {
            key: key.to_string(),
            fields: fields.to_vec(),
        })
    }

    fn hgetall(&self, key: &str) -> Result<Fields> {
        match self.call(&Command::HGetAll {
            key: key.to_string(),
        })? {
            Reply::Fields(fields) => Ok(fields),
            other => Err(unexpected("HGETALL", &other)),
        }
    }

    fn del(&self, key: &str) -> Result<bool> {
        Ok(self.integer(Command::Del {
            key: key.to_string(),
        })? > 0)
    }

    fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        Ok(self.integer(Command::ZAdd {
            key: key.to_string(),
            score,
            member: member.to_string(),
        })? > 0)
    }

    fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.integer(Command::ZRem {
            key: key.to_string(),
            member: member.to_string(),
        })? > 0)
    }

    fn zcard(&self, key: &str) -> Result<u64> {
        self.integer(Command::ZCard {
            key: key.to_string(),
        })
    }

    fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        match self.call(&Command::ZRange {
            key: key.to_string(),
            start,
            stop,
        })? {
            Reply::Members(members) => Ok(members),
            other => Err(unexpected("ZRANGE", &other)),
        }
    }

    fn batch(&self, ops: &[StoreOp]) -> Result<Vec<u64>> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }
        match self.call(&Command::Batch { ops: ops.to_vec() })? {
            Reply::Integers(replies) if replies.len() == ops.len() => Ok(replies),
            other => Err(unexpected("BATCH", &other)),
        }
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::HSet { .. } => "HSET",
        Command::HGetAll { .. } => "HGETALL",
        Command::Del { .. } => "DEL",
        Command::ZAdd { .. } => "ZADD",
        Command::ZRem { .. } => "ZREM",
        Command::ZCard { .. } => "ZCARD",
        Command::ZRange { .. } => "ZRANGE",
        Command::Batch { .. } => "BATCH",
        Command::Ping => "PING",
    }
}

fn unexpected(command: &str, reply: &Reply) -> CatalogError {
    CatalogError::Protocol(format!("unexpected reply to {}: {:?}", command, reply))
}
