//! Application-level configuration loading for ranking and fan-out tunables.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARCADE_RANK_BACK_CONFIG_PATH";

/// Entries retained per leaderboard when the file sets nothing.
const DEFAULT_RANKING_CAP: usize = 1000;
/// Entries included in pushed rankings snapshots.
const DEFAULT_BROADCAST_TOP_K: usize = 10;
/// Score events buffered between submission and the updater workers.
const DEFAULT_BUS_CAPACITY: usize = 1024;
/// Updater worker tasks draining the event bus.
const DEFAULT_CONSUMER_WORKERS: usize = 1;
/// Budget for a fallback query against the score store.
const DEFAULT_FALLBACK_QUERY_TIMEOUT_MS: u64 = 250;
/// Rankings snapshots buffered per game-type fan-out channel.
const DEFAULT_FANOUT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    ranking_cap: usize,
    broadcast_top_k: usize,
    bus_capacity: usize,
    consumer_workers: usize,
    fallback_query_timeout: Duration,
    fanout_channel_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        ranking_cap = app_config.ranking_cap,
                        broadcast_top_k = app_config.broadcast_top_k,
                        "loaded configuration from file"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Maximum entries retained per game-type leaderboard.
    pub fn ranking_cap(&self) -> usize {
        self.ranking_cap
    }

    /// Entries included in each pushed rankings snapshot.
    pub fn broadcast_top_k(&self) -> usize {
        self.broadcast_top_k
    }

    /// Buffer size of the score event bus.
    pub fn bus_capacity(&self) -> usize {
        self.bus_capacity
    }

    /// Number of updater workers draining the event bus.
    pub fn consumer_workers(&self) -> usize {
        self.consumer_workers
    }

    /// Budget for top-K and history queries against the score store.
    pub fn fallback_query_timeout(&self) -> Duration {
        self.fallback_query_timeout
    }

    /// Buffer size of each per-game-type fan-out channel.
    pub fn fanout_channel_capacity(&self) -> usize {
        self.fanout_channel_capacity
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ranking_cap: DEFAULT_RANKING_CAP,
            broadcast_top_k: DEFAULT_BROADCAST_TOP_K,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            consumer_workers: DEFAULT_CONSUMER_WORKERS,
            fallback_query_timeout: Duration::from_millis(DEFAULT_FALLBACK_QUERY_TIMEOUT_MS),
            fanout_channel_capacity: DEFAULT_FANOUT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Every field is optional so a partial file only overrides what it names.
struct RawConfig {
    ranking_cap: Option<usize>,
    broadcast_top_k: Option<usize>,
    bus_capacity: Option<usize>,
    consumer_workers: Option<usize>,
    fallback_query_timeout_ms: Option<u64>,
    fanout_channel_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            ranking_cap: value.ranking_cap.unwrap_or(defaults.ranking_cap).max(1),
            broadcast_top_k: value
                .broadcast_top_k
                .unwrap_or(defaults.broadcast_top_k)
                .max(1),
            bus_capacity: value.bus_capacity.unwrap_or(defaults.bus_capacity).max(1),
            consumer_workers: value
                .consumer_workers
                .unwrap_or(defaults.consumer_workers)
                .max(1),
            fallback_query_timeout: value
                .fallback_query_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.fallback_query_timeout),
            fanout_channel_capacity: value
                .fanout_channel_capacity
                .unwrap_or(defaults.fanout_channel_capacity)
                .max(1),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
