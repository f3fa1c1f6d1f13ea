// crates/summit-daemon/src/config.rs
//
// Runtime configuration for the Summit daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use summit_progression::DEFAULT_DAILY_RATE;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Store backend: "rocks" or "memory" (memory is dev-only and
    /// loses everything on restart).
    #[serde(default = "default_store_backend")]
    pub store_backend: String,

    /// Seconds between yield sweeps. One day in production; dev
    /// deployments compress it.
    #[serde(default = "default_yield_interval_secs")]
    pub yield_interval_secs: u64,

    /// Daily yield rate on the core balance.
    #[serde(default = "default_daily_rate")]
    pub daily_rate: f64,
}

fn default_data_dir() -> String {
    "~/.summit/data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_backend() -> String {
    "rocks".to_string()
}

fn default_yield_interval_secs() -> u64 {
    86_400
}

fn default_daily_rate() -> f64 {
    DEFAULT_DAILY_RATE
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            store_backend: default_store_backend(),
            yield_interval_secs: default_yield_interval_secs(),
            daily_rate: default_daily_rate(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}
