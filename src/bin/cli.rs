//! catalogdb CLI Client
//!
//! Command-line interface for browsing and editing a catalog collection.

use chrono::Utc;
use clap::{Parser, Subcommand};

use catalogdb::catalog::parse_timestamp;
use catalogdb::{Catalog, CatalogOptions, Entity, Record, RemoteStore, Repository, Result};

/// catalogdb CLI
#[derive(Parser, Debug)]
#[command(name = "catalogdb-cli")]
#[command(about = "CLI for the catalogdb package catalog")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Collection key prefix
    #[arg(short, long, default_value = "repositories")]
    collection: String,

    /// Indexed field (repeatable)
    #[arg(short, long = "index", default_values_t = vec!["name".to_string()])]
    indexes: Vec<String>,

    /// Socket timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Number of records
    Count,

    /// Every record in rank order
    List,

    /// Records ranked offset..=offset+limit
    Take {
        limit: u64,
        #[arg(default_value = "0")]
        offset: u64,
    },

    /// Show one record
    Get {
        /// The record identifier
        id: String,
    },

    /// Records whose field equals value
    Search { field: String, value: String },

    /// Delete a record
    Delete {
        /// The record identifier
        id: String,
    },

    /// Add or replace a repository
    AddRepository {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Explicit rank (default: end of the sequence)
        #[arg(short, long)]
        rank: Option<i64>,

        #[arg(short, long)]
        templated: bool,

        /// Creation time (default: now)
        #[arg(long)]
        created_on: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let store = RemoteStore::connect_with_timeouts(&args.server, args.timeout_ms, args.timeout_ms)?;

    if let Commands::Ping = args.command {
        store.ping()?;
        println!("PONG");
        return Ok(());
    }

    let options = CatalogOptions::new()
        .key_storage(&args.collection)
        .fields(args.indexes);
    let catalog = Catalog::new(store, options)?;

    match args.command {
        Commands::Ping => {}
        Commands::Count => println!("{}", catalog.count()?),
        Commands::List => print_records(&catalog.all()?),
        Commands::Take { limit, offset } => print_records(&catalog.take(limit, offset)?),
        Commands::Get { id } => {
            let record = catalog.retrieve(&id)?;
            if record.is_empty() {
                println!("(not found)");
            } else {
                println!("{}", record);
            }
        }
        Commands::Search { field, value } => {
            print_records(&catalog.search(Some(field.as_str()), Some(value.as_str())).all()?)
        }
        Commands::Delete { id } => {
            if catalog.delete(&id)? {
                println!("deleted {}", id);
            } else {
                println!("(not found)");
            }
        }
        Commands::AddRepository {
            name,
            description,
            rank,
            templated,
            created_on,
        } => {
            let created_on = match created_on {
                Some(raw) => parse_timestamp(&raw)?,
                None => Utc::now(),
            };
            let repository = Repository::new(None, name, description, created_on, 0, templated);
            let mut record = repository.to_record();
            match rank {
                Some(rank) => record.set("rank", rank),
                None => {
                    record.remove("rank");
                }
            }
            println!("{}", catalog.persist(&record)?);
        }
    }

    Ok(())
}

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("(empty)");
    }
    for record in records {
        println!("{}", record);
    }
}
