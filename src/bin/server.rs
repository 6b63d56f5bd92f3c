//! catalogdb Server Binary
//!
//! Starts the TCP server for the catalog store.

use std::sync::Arc;

use catalogdb::config::WalSyncStrategy;
use catalogdb::network::Server;
use catalogdb::{Config, Engine};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// catalogdb Server
#[derive(Parser, Debug)]
#[command(name = "catalogdb-server")]
#[command(about = "Hash-map and sorted-set store backing the package catalog")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./catalogdb_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Maximum queued and active connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Connection worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// fsync the WAL every N entries (0 = after every write)
    #[arg(long, default_value = "100")]
    sync_every: usize,

    /// Run purely in memory, without a WAL
    #[arg(long)]
    no_wal: bool,

    /// Checkpoint the WAL on startup
    #[arg(long)]
    checkpoint: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalogdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("catalogdb server v{}", catalogdb::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync_strategy = match args.sync_every {
        0 => WalSyncStrategy::EveryWrite,
        count => WalSyncStrategy::EveryNEntries { count },
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .wal_enabled(!args.no_wal)
        .wal_sync_strategy(sync_strategy)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized with {} keys", engine.key_count());

    if args.checkpoint {
        if let Err(e) = engine.checkpoint() {
            tracing::error!("Checkpoint failed: {}", e);
            std::process::exit(1);
        }
    }

    let server = match Server::bind(config, engine) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
