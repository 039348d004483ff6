//! padbridge - streams local game controllers to a remote receiver
//!
//! Polls controller state once per display-refresh-equivalent tick,
//! remaps each device's physical button layout onto the canonical
//! logical layout, scales readings into the fixed wire format and
//! streams one JSON text frame per tick per controller over a dedicated
//! WebSocket connection.
//!
//! # Subsystems
//!
//! - [`layout`] - identity string → remap table registry
//! - [`input`] - host input access behind the [`input::InputSource`] seam
//! - [`wire`] - scaling and JSON encoding of per-frame updates
//! - [`bridge`] - connection lifecycle and the frame polling loop
//! - [`config`] / [`cli`] - TOML configuration and flag overrides

pub mod bridge;
pub mod cli;
pub mod config;
pub mod input;
pub mod layout;
pub mod wire;
