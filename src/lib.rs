//! # catalogdb
//!
//! A package/repository catalog on top of a hash-map + sorted-set
//! key-value store:
//! - Records stored as hash-maps, listed through a rank-ordered sequence
//! - Secondary field indexes for equality search
//! - Atomic multi-key batches
//! - Write-Ahead Logging (WAL) with crash recovery
//! - TCP server and blocking client
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Catalog<S: KvStore>                          │
//! │      persist / retrieve / delete / search / take / count     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ KvStore (hset, hgetall, del, zadd,
//!                       │          zrem, zcard, zrange, batch)
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐      ┌─────────────┐
//!   │   Engine    │◄─────────│ TCP Server  │◄─────│ RemoteStore │
//!   │             │          └─────────────┘      └─────────────┘
//!   └──────┬──────┘
//!          │
//!    ┌─────┴───────┐
//!    ▼             ▼
//! ┌─────────┐ ┌──────────┐
//! │   WAL   │ │ Keyspace │
//! │(Append) │ │ (RwLock) │
//! └─────────┘ └──────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod keyspace;
pub mod wal;
pub mod engine;
pub mod protocol;
pub mod network;
pub mod client;
pub mod catalog;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CatalogError, Result};
pub use config::{CatalogConfig, CatalogOptions, Config};
pub use store::{Fields, KvStore, StoreOp};
pub use engine::Engine;
pub use client::RemoteStore;
pub use catalog::{Catalog, Entity, Package, Record, Repository};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of catalogdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
