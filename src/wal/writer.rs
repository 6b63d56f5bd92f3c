//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::WalEntry;
use crate::config::WalSyncStrategy;
use crate::error::{CatalogError, Result};
use crate::store::StoreOp;

/// Writes entries to the WAL file
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,

    /// LSN of the last entry written (0 = none)
    current_lsn: u64,

    sync_strategy: WalSyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    ///
    /// `last_lsn` is the LSN of the last valid entry already in the file
    /// (as reported by recovery); new entries continue from there.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: last_lsn,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append one entry holding `ops`, returning its LSN
    pub fn append(&mut self, ops: &[StoreOp]) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let bytes = WalEntry::new(lsn, ops.to_vec()).encode()?;

        self.writer
            .write_all(&bytes)
            .and_then(|_| self.writer.flush())
            .map_err(|e| CatalogError::WalWrite(format!("append LSN {}: {}", lsn, e)))?;

        self.current_lsn = lsn;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Replace the whole log with a single entry holding `ops`
    ///
    /// The new log is written next to the old one and renamed over it, so a
    /// crash leaves either the old or the new file in place.
    pub fn rewrite(&mut self, ops: &[StoreOp]) -> Result<u64> {
        self.sync()?;

        let lsn = self.current_lsn + 1;
        let tmp_path = self.path.with_extension("log.tmp");
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            if !ops.is_empty() {
                tmp.write_all(&WalEntry::new(lsn, ops.to_vec()).encode()?)?;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        self.current_lsn = lsn;
        self.unsynced = 0;

        Ok(lsn)
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
