//! Application-level configuration loading.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_PANEL_CONFIG_PATH";

/// Capacity of the change notification channel.
const DEFAULT_CHANGE_HUB_CAPACITY: usize = 16;
/// Keep-alive interval for SSE streams, in seconds.
const DEFAULT_SSE_KEEPALIVE_SECS: u64 = 15;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Capacity of the change hub broadcast channel.
    pub change_hub_capacity: usize,
    /// Keep-alive interval of SSE streams, in seconds.
    pub sse_keepalive_secs: u64,
    /// Optional cap on the number of leaderboard rows returned to panels.
    pub leaderboard_limit: Option<usize>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded panel configuration");
                    config
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
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            change_hub_capacity: DEFAULT_CHANGE_HUB_CAPACITY,
            sse_keepalive_secs: DEFAULT_SSE_KEEPALIVE_SECS,
            leaderboard_limit: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    change_hub_capacity: Option<usize>,
    sse_keepalive_secs: Option<u64>,
    leaderboard_limit: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            change_hub_capacity: raw
                .change_hub_capacity
                .unwrap_or(defaults.change_hub_capacity),
            sse_keepalive_secs: raw
                .sse_keepalive_secs
                .unwrap_or(defaults.sse_keepalive_secs),
            leaderboard_limit: raw.leaderboard_limit,
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
