//! Client sessions
//!
//! One request in flight per session: read a frame, run it against the
//! engine, write the answer. Store errors (wrong type, bad arguments) are
//! answered and the session goes on; framing errors end it.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{CatalogError, Result};
use crate::protocol::{read_command, write_response, Command, Response};

/// What to do after serving one request
enum Next {
    Continue,
    Close,
}

/// A client session bound to the shared engine
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    engine: Arc<Engine>,
    peer_addr: String,

    /// Requests answered so far
    served: u64,
}

impl Connection {
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = match stream.peer_addr() {
            Ok(addr) => addr.to_string(),
            Err(_) => "unknown".to_string(),
        };
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
            engine,
            peer_addr,
            served: 0,
        })
    }

    /// Socket timeouts in milliseconds (0 = block forever)
    ///
    /// An idle client is dropped once the read timeout passes.
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.reader.get_ref().set_read_timeout(millis(read_ms))?;
        self.writer.get_ref().set_write_timeout(millis(write_ms))?;
        Ok(())
    }

    /// Serve requests until the client leaves, idles out, or breaks framing
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Session opened for {}", self.peer_addr);

        let outcome = loop {
            match self.serve_one() {
                Ok(Next::Continue) => {}
                Ok(Next::Close) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        tracing::debug!(
            "Session for {} closed after {} requests",
            self.peer_addr,
            self.served
        );
        outcome
    }

    fn serve_one(&mut self) -> Result<Next> {
        let command = match read_command(&mut self.reader) {
            Ok(command) => command,
            Err(CatalogError::Io(ref e)) if ends_session(e.kind()) => {
                tracing::trace!("{} went quiet ({:?})", self.peer_addr, e.kind());
                return Ok(Next::Close);
            }
            Err(e) => {
                tracing::warn!("Bad request from {}: {}", self.peer_addr, e);
                let _ = write_response(&mut self.writer, &Response::error(&e.to_string()));
                return Err(e);
            }
        };

        tracing::trace!("{} -> {:?}", self.peer_addr, command.command_type());
        let response = respond(&self.engine, command);
        self.served += 1;

        match write_response(&mut self.writer, &response) {
            Ok(()) => Ok(Next::Continue),
            Err(CatalogError::Io(ref e))
                if ends_session(e.kind()) || e.kind() == ErrorKind::BrokenPipe =>
            {
                tracing::debug!("{} left before its answer was sent", self.peer_addr);
                Ok(Next::Close)
            }
            Err(e) => Err(e),
        }
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub fn served(&self) -> u64 {
        self.served
    }
}

/// Run one command, folding failures into an error response
fn respond(engine: &Engine, command: Command) -> Response {
    engine
        .execute(command)
        .and_then(|reply| Response::ok(&reply))
        .unwrap_or_else(|e| Response::error(&e.to_string()))
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// I/O errors that end a session without being a fault: the peer hung up,
/// or the read timeout passed (`WouldBlock` on Unix, `TimedOut` on Windows)
fn ends_session(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::WouldBlock
            | ErrorKind::TimedOut
    )
}
