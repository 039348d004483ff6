//! Controller-to-wire bridge
//!
//! The core of the daemon, split into two stages:
//!
//! 1. [`connection`] - per-controller socket lifecycle and handshake
//! 2. [`frame_bridge`] - the per-frame polling, remap and transmit loop
//!
//! # Architecture
//!
//! ```text
//! Host input ──► FrameBridge ──► WireMessage ──► SlotLink ──► Receiver
//!               (attach/detach)    (remap+scale)  (per slot)
//! ```
//!
//! Everything with state runs on one task; socket opens and sends are the
//! only operations that cross a suspension boundary, and their
//! completions re-enter the task as [`connection::LinkEvent`] messages.

pub mod connection;
pub mod frame_bridge;

pub use connection::{ConnectionManager, LinkEvent, SlotLink};
pub use frame_bridge::{BridgeError, BridgeHandle, FrameBridge};
