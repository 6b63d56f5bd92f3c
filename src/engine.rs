//! Engine Module
//!
//! The store engine that coordinates the WAL and the keyspace.
//!
//! ## Responsibilities
//! - Serve the hash-map / sorted-set primitives of [`KvStore`]
//! - Apply batches atomically: validate, log, then apply under one lock
//! - Replay the WAL on startup
//! - Checkpoint the WAL into a single snapshot entry

use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::keyspace::Keyspace;
use crate::protocol::{Command, Reply};
use crate::store::{Fields, KvStore, StoreOp};
use crate::wal::{WalRecovery, WalWriter};

/// The store engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (every mutation is a batch): Serialized by `write_lock`
///   - Only ONE batch at a time
///   - Must acquire: write_lock → validate → WAL → keyspace (write)
///
/// - **Reads**: No write_lock needed
///   - Keyspace uses an internal RwLock (many concurrent readers)
///   - A batch is applied under a single keyspace write lock, so readers
///     see it entirely or not at all
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Write-ahead log (None when running purely in memory)
    wal: Option<Mutex<WalWriter>>,

    /// All keys (internal RwLock)
    keyspace: Keyspace,

    /// Serializes batches
    write_lock: Mutex<()>,
}

impl Engine {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";

    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Recover entries from the WAL, truncating a torn tail
    /// 3. Replay them into the keyspace
    /// 4. Ready to serve requests
    ///
    /// With `wal_enabled = false` nothing touches the disk.
    pub fn open(config: Config) -> Result<Self> {
        let keyspace = Keyspace::new();

        if !config.wal_enabled {
            tracing::info!("Engine running in memory, WAL disabled");
            return Ok(Self {
                config,
                wal: None,
                keyspace,
                write_lock: Mutex::new(()),
            });
        }

        fs::create_dir_all(&config.data_dir)?;
        let wal_path = config.data_dir.join(Self::WAL_FILENAME);

        let (entries, recovery) = WalRecovery::recover(&wal_path)?;
        if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
            tracing::info!(
                "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                recovery.entries_recovered,
                recovery.entries_corrupted,
                recovery.last_lsn
            );
        }

        for entry in &entries {
            keyspace.apply(&entry.ops);
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy, recovery.last_lsn)?;

        Ok(Self {
            config,
            wal: Some(Mutex::new(wal)),
            keyspace,
            write_lock: Mutex::new(()),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    /// A volatile engine with no WAL
    pub fn in_memory() -> Self {
        Self {
            config: Config::builder().wal_enabled(false).build(),
            wal: None,
            keyspace: Keyspace::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::HSet { key, fields } => Ok(Reply::Integer(self.hset(&key, &fields)?)),
            Command::HGetAll { key } => Ok(Reply::Fields(self.hgetall(&key)?)),
            Command::Del { key } => Ok(Reply::Integer(self.del(&key)? as u64)),
            Command::ZAdd { key, score, member } => {
                Ok(Reply::Integer(self.zadd(&key, score, &member)? as u64))
            }
            Command::ZRem { key, member } => Ok(Reply::Integer(self.zrem(&key, &member)? as u64)),
            Command::ZCard { key } => Ok(Reply::Integer(self.zcard(&key)?)),
            Command::ZRange { key, start, stop } => {
                Ok(Reply::Members(self.zrange(&key, start, stop)?))
            }
            Command::Batch { ops } => Ok(Reply::Integers(self.write(&ops)?)),
            Command::Ping => Ok(Reply::Pong),
        }
    }

    /// Apply a batch of mutations atomically
    ///
    /// Steps:
    /// 1. Acquire write lock
    /// 2. Validate every operation (nothing is written on failure)
    /// 3. Append one WAL entry (durability)
    /// 4. Apply to the keyspace
    pub fn write(&self, ops: &[StoreOp]) -> Result<Vec<u64>> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }

        let _write_guard = self.write_lock.lock();

        self.keyspace.validate(ops)?;

        if let Some(wal) = &self.wal {
            let lsn = wal.lock().append(ops)?;
            tracing::trace!("Logged {} ops at LSN {}", ops.len(), lsn);
        }

        Ok(self.keyspace.apply(ops))
    }

    /// Rewrite the WAL as one snapshot entry of the current keyspace
    ///
    /// No-op for in-memory engines.
    pub fn checkpoint(&self) -> Result<()> {
        let Some(wal) = &self.wal else {
            return Ok(());
        };

        let _write_guard = self.write_lock.lock();
        let snapshot = self.keyspace.snapshot();
        let lsn = wal.lock().rewrite(&snapshot)?;

        tracing::info!(
            "WAL checkpoint at LSN {}: {} ops over {} keys",
            lsn,
            snapshot.len(),
            self.keyspace.len()
        );
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Syncs the WAL to ensure all data is on disk
    pub fn close(self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.lock().sync()?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Number of keys held
    pub fn key_count(&self) -> usize {
        self.keyspace.len()
    }

    /// LSN of the last logged batch (0 without a WAL)
    pub fn current_lsn(&self) -> u64 {
        self.wal
            .as_ref()
            .map(|wal| wal.lock().current_lsn())
            .unwrap_or(0)
    }

    /// Score of a sorted set member
    pub fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.keyspace.zscore(key, member)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl KvStore for Engine {
    fn hset(&self, key: &str, fields: &[(String, String)]) -> Result<u64> {
        let ops = [StoreOp::HSet {
            key: key.to_string(),
            fields: fields.to_vec(),
        }];
        Ok(self.write(&ops)?[0])
    }

    fn hgetall(&self, key: &str) -> Result<Fields> {
        self.keyspace.hgetall(key)
    }

    fn del(&self, key: &str) -> Result<bool> {
        let ops = [StoreOp::Del {
            key: key.to_string(),
        }];
        Ok(self.write(&ops)?[0] > 0)
    }

    fn zadd(&self, key: &str, score: f64, member: &str) -> Result<bool> {
        let ops = [StoreOp::ZAdd {
            key: key.to_string(),
            score,
            member: member.to_string(),
        }];
        Ok(self.write(&ops)?[0] > 0)
    }

    fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        let ops = [StoreOp::ZRem {
            key: key.to_string(),
            member: member.to_string(),
        }];
        Ok(self.write(&ops)?[0] > 0)
    }

    fn zcard(&self, key: &str) -> Result<u64> {
        self.keyspace.zcard(key)
    }

    fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        self.keyspace.zrange(key, start, stop)
    }

    fn batch(&self, ops: &[StoreOp]) -> Result<Vec<u64>> {
        self.write(ops)
    }
}
