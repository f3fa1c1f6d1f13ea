// crates/summit-daemon/src/main.rs
//
// Binary entrypoint for the Summit daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration, opens
// the progress store, and runs the daily yield sweep with level
// reconciliation.

mod config;
mod notify;
mod sweeper;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use config::DaemonConfig;
use notify::LogNotifier;
use summit_core::traits::ProgressStore;
use summit_ledger::{BalanceLedger, LevelWatcher};
use summit_store::{MemoryStore, RocksStore};
use sweeper::YieldSweeper;

/// Summit daemon: applies daily yield and reconciles levels.
#[derive(Parser, Debug)]
#[command(name = "summit-daemon", version = "0.1.0", about = "Summit progression ledger daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.summit/config.toml")]
    config: String,

    /// Store backend override: "rocks" or "memory".
    #[arg(long)]
    store: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration from TOML file, falling back to defaults if the
    // file is not found.
    let config_result = DaemonConfig::load(&expand_tilde(&args.config));
    let mut daemon_config = match &config_result {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // CLI --store flag overrides the config file value.
    if let Some(store) = args.store {
        daemon_config.store_backend = store;
    }

    // Initialize tracing subscriber for structured logging. RUST_LOG
    // wins; the config's log_level is the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match config_result {
        Ok(_) => tracing::info!("Loaded configuration from {}", args.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            args.config,
            e
        ),
    }

    tracing::info!("Summit Daemon v0.1.0");
    tracing::info!("Store backend: {}", daemon_config.store_backend);
    tracing::info!("Data directory: {}", daemon_config.data_dir);
    tracing::info!("Yield interval: {}s", daemon_config.yield_interval_secs);
    tracing::info!("Daily rate: {}", daemon_config.daily_rate);

    let store: Arc<dyn ProgressStore> = match daemon_config.store_backend.as_str() {
        "memory" => {
            tracing::warn!("Memory store selected; all records are lost on shutdown");
            Arc::new(MemoryStore::new())
        }
        _ => {
            let data_dir = expand_tilde(&daemon_config.data_dir);
            let db_path = format!("{}/progress_rocksdb", data_dir);
            let rocks = RocksStore::open(&db_path)?;
            tracing::info!("RocksDB store opened at {}", db_path);
            Arc::new(rocks)
        }
    };

    let ledger = Arc::new(BalanceLedger::new(store.clone()));
    let watcher = Arc::new(LevelWatcher::new(store.clone(), Arc::new(LogNotifier)));

    let sweeper = YieldSweeper::new(
        store,
        ledger,
        watcher,
        Duration::from_secs(daemon_config.yield_interval_secs),
        daemon_config.daily_rate,
    );
    sweeper.run().await
}

/// Expand a leading `~/` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}
