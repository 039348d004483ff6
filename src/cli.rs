//! Command line interface
//!
//! Flags override individual fields of the loaded configuration file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::BridgeConfig;

/// Streams local game controllers to a GamepadServer receiver over WebSocket
#[derive(Parser, Debug)]
#[command(name = "padbridge", version, about)]
pub struct Args {
    /// Path to the config file (default: <config dir>/padbridge/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Receiver host
    #[arg(long)]
    pub server: Option<String>,

    /// Receiver port
    #[arg(long)]
    pub port: Option<u16>,

    /// Frame tick interval in milliseconds
    #[arg(long)]
    pub frame_interval_ms: Option<u64>,

    /// Force the presence-polling fallback instead of attach/detach events
    #[arg(long)]
    pub force_polling: bool,
}

impl Args {
    /// Overlays the parsed flags onto a loaded configuration.
    pub fn apply(&self, config: &mut BridgeConfig) {
        if let Some(host) = &self.server {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(interval) = self.frame_interval_ms {
            config.bridge.frame_interval_ms = interval;
        }
        if self.force_polling {
            config.bridge.force_polling = true;
        }
    }
}
