//! RangeKV Server Binary
//!
//! Opens the store and serves it over HTTP.

use std::sync::Arc;

use clap::Parser;
use rangekv::server::Server;
use rangekv::{Config, Engine, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// RangeKV Server
#[derive(Parser, Debug)]
#[command(name = "rangekv-server")]
#[command(about = "Ordered key-value store with range scans over HTTP")]
#[command(version)]
struct Args {
    /// Data directory
    data_dir: String,

    /// Listen address: host:port for TCP, otherwise a unix socket path.
    /// May be given more than once.
    #[arg(short = 's', long = "serveaddr", default_value = "127.0.0.1:7000")]
    serve_addrs: Vec<String>,

    /// MemTable size limit in MB before flush
    #[arg(short = 'm', long, default_value = "64")]
    memtable_mb: usize,

    /// Number of SSTable values kept in the read cache
    #[arg(long, default_value = "8192")]
    cache_entries: usize,

    /// fsync the WAL every N writes (1 syncs every write)
    #[arg(long, default_value = "100")]
    sync_every: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rangekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("RangeKV Server v{}", rangekv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);

    let sync_strategy = match args.sync_every {
        1 => WalSyncStrategy::EveryWrite,
        count => WalSyncStrategy::EveryNEntries { count },
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addrs(args.serve_addrs)
        .memtable_size_limit(args.memtable_mb * 1024 * 1024)
        .cache_capacity(args.cache_entries)
        .wal_sync_strategy(sync_strategy)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    let server = Server::new(config, Arc::clone(&engine));
    let served = server.run();
    drop(server);

    // Persist the memtable so the next start does not replay the WAL
    if let Err(e) = engine.flush() {
        tracing::error!("Failed to flush engine: {}", e);
    }

    if let Err(e) = served {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
