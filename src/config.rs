//! Configuration for catalogdb
//!
//! Centralized configuration with sensible defaults.
//!
//! - [`Config`]: the store engine and its TCP server
//! - [`CatalogOptions`] / [`CatalogConfig`]: key layout and indexable fields
//!   of one catalog collection

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::error::{CatalogError, Result};

/// Main configuration for a store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── wal.log          (write-ahead log)
    pub data_dir: PathBuf,

    /// Whether writes are logged to the WAL (false = purely in-memory)
    pub wal_enabled: bool,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max connections waiting for or being served by a worker
    pub max_connections: usize,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./catalogdb_data"),
            wal_enabled: true,
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            listen_addr: "127.0.0.1:6379".to_string(),
            max_connections: 1024,
            worker_threads: 8,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Enable or disable the write-ahead log
    pub fn wal_enabled(mut self, enabled: bool) -> Self {
        self.config.wal_enabled = enabled;
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of queued and active connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Catalog Configuration
// =============================================================================

/// Suffix appended to `key_storage` when no sequence key is given
pub const SEQUENCE_SUFFIX: &str = ":sequence";

/// Partial catalog configuration, merged into a [`CatalogConfig`]
///
/// Every option left unset keeps its current value on merge.
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Base key prefix for record hash-maps
    pub key_storage: Option<String>,

    /// Key of the sequence index
    pub key_sequence: Option<String>,

    /// Fields that get a secondary index (replaces the current set)
    pub fields: Option<BTreeSet<String>>,
}

impl CatalogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record key prefix
    pub fn key_storage(mut self, prefix: impl Into<String>) -> Self {
        self.key_storage = Some(prefix.into());
        self
    }

    /// Set the sequence index key explicitly
    pub fn key_sequence(mut self, key: impl Into<String>) -> Self {
        self.key_sequence = Some(key.into());
        self
    }

    /// Set the indexable fields
    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// Resolved configuration of one catalog collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Base key prefix for record hash-maps (`{key_storage}:{id}`)
    pub key_storage: String,

    /// Key of the sequence index
    pub key_sequence: String,

    /// Fields eligible for secondary indexing
    pub fields: BTreeSet<String>,
}

impl CatalogConfig {
    /// Resolve a configuration from scratch
    pub fn from_options(options: CatalogOptions) -> Result<Self> {
        let mut config = Self::default();
        config.merge(options)?;
        Ok(config)
    }

    /// Merge options into this configuration
    ///
    /// A new `key_storage` without an explicit `key_sequence` derives the
    /// sequence key as `key_storage + ":sequence"`. The resulting
    /// `key_storage` must not be empty.
    pub fn merge(&mut self, options: CatalogOptions) -> Result<()> {
        let mut merged = self.clone();

        if let Some(storage) = options.key_storage {
            if !storage.is_empty() && options.key_sequence.is_none() {
                merged.key_sequence = format!("{}{}", storage, SEQUENCE_SUFFIX);
            }
            merged.key_storage = storage;
        }
        if let Some(sequence) = options.key_sequence {
            merged.key_sequence = sequence;
        }
        if let Some(fields) = options.fields {
            merged.fields = fields;
        }

        if merged.key_storage.is_empty() {
            return Err(CatalogError::Config(
                "key_storage must not be empty".to_string(),
            ));
        }
        if merged.key_sequence.is_empty() {
            return Err(CatalogError::Config(
                "key_sequence must not be empty".to_string(),
            ));
        }

        *self = merged;
        Ok(())
    }

    /// Whether `field` has a secondary index
    pub fn is_indexed(&self, field: &str) -> bool {
        self.fields.contains(field)
    }
}
