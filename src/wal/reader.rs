//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use super::entry::{HEADER_SIZE, MAX_ENTRY_SIZE};
use super::WalEntry;
use crate::error::{CatalogError, Result};

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset just past the last entry read successfully
    position: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file. A header or data section
    /// cut short by a crash, or a checksum mismatch, is reported as
    /// `WalCorruption`; `position()` still points at the end of the last
    /// good entry.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = read_full(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(CatalogError::WalCorruption(format!(
                "torn header at offset {} ({} of {} bytes)",
                self.position, read, HEADER_SIZE
            )));
        }

        let mut lsn_bytes = [0u8; 8];
        lsn_bytes.copy_from_slice(&header[0..8]);
        let lsn = u64::from_be_bytes(lsn_bytes);
        let crc = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);
        let len = u32::from_be_bytes([header[12], header[13], header[14], header[15]]);

        if len > MAX_ENTRY_SIZE {
            return Err(CatalogError::WalCorruption(format!(
                "entry length {} at offset {} exceeds limit",
                len, self.position
            )));
        }

        let mut data = vec![0u8; len as usize];
        let read = read_full(&mut self.reader, &mut data)?;
        if read < data.len() {
            return Err(CatalogError::WalCorruption(format!(
                "torn entry at offset {} ({} of {} bytes)",
                self.position, read, len
            )));
        }

        let entry = WalEntry::decode(lsn, crc, &data)?;
        self.position += (HEADER_SIZE + data.len()) as u64;
        Ok(Some(entry))
    }

    /// Offset just past the last entry read successfully
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over WAL entries
///
/// Yields the first error and then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read until `buf` is full or EOF, returning the number of bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
