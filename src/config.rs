//! Configuration loading for the bridge daemon
//!
//! Settings live in a TOML file at `<config dir>/padbridge/config.toml`
//! and fall back to defaults when the file is absent. Command line flags
//! override individual fields after loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, toml::de::Error),
}

/// Receiver endpoint settings.
///
/// The socket target is fixed-path: `ws://<host>:<port><path>`, the same
/// host and port serving the receiver, path `/ws`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3080,
            path: "/ws".to_string(),
        }
    }
}

impl ServerConfig {
    /// Derives the WebSocket endpoint URL for controller connections.
    pub fn endpoint(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Frame loop and connection lifecycle settings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BridgeSettings {
    /// Frame tick interval in milliseconds (display-refresh equivalent)
    pub frame_interval_ms: u64,

    /// Presence re-scan interval for the polling fallback, in milliseconds
    pub scan_interval_ms: u64,

    /// Forces the polling fallback even when the backend has native
    /// attach/detach events
    pub force_polling: bool,

    /// Optional cap on a socket open attempt, in milliseconds.
    ///
    /// Unset by default: a hung connection attempt is allowed to hang,
    /// leaving the slot tracked without transmission.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            scan_interval_ms: 500,
            force_polling: false,
            connect_timeout_ms: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub bridge: BridgeSettings,
}

impl BridgeConfig {
    /// Loads configuration from the given path, or the default location
    /// when none is given. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => {
                    debug!("No config directory available, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(path.clone(), e))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("padbridge").join("config.toml"))
}
