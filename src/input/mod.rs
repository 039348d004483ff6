//! Input subsystem for host controller access
//!
//! Defines the snapshot-oriented contract between the frame loop and the
//! host input backend:
//!
//! 1. [`InputSource`] - polling interface implemented by backends
//! 2. [`gilrs_source`] - gilrs-backed implementation for native hosts
//!
//! # Architecture
//!
//! ```text
//! Host API ──► InputSource ──► HostEvent (attach/detach)
//!                         └──► ControllerState (per-frame snapshot)
//! ```
//!
//! Backends are drained and re-polled from a single task, so no locking
//! is involved; each snapshot replaces the previous one wholesale.

pub mod gilrs_source;

pub use gilrs_source::GilrsSource;

/// Controller slot index assigned by the host, stable while attached.
pub type SlotId = usize;

/// Errors raised by an input backend
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The backend could not be brought up (driver or permission issues)
    #[error("Failed to initialize input backend: {0}")]
    InitializationError(String),
}

/// Normalized reading of a single physical button.
///
/// Hosts report buttons either as a plain scalar or as a structured
/// object with pressed/touched flags. Both shapes normalize into this
/// record; the flags are defaulted when only a scalar is available.
/// Only `value` reaches the wire, the flags are presentation metadata.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButtonReading {
    pub value: f32,
    pub pressed: bool,
    pub touched: bool,
}

impl ButtonReading {
    /// Normalizes a scalar-only reading, defaulting the flags.
    pub fn from_value(value: f32) -> Self {
        Self {
            value,
            pressed: value >= 1.0,
            touched: false,
        }
    }
}

/// Snapshot of one controller at one frame tick.
///
/// Read-only once taken; the frame loop replaces it wholesale on every
/// successful re-poll and never mutates it in place.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerState {
    /// Host-reported identity, immutable while the controller is attached
    pub identity: String,
    /// Button readings in physical order
    pub buttons: Vec<ButtonReading>,
    /// Axis readings in physical order, each in `[-1, 1]`
    pub axes: Vec<f32>,
}

/// Attach/detach notification from the host.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    Attached { slot: SlotId, identity: String },
    Detached { slot: SlotId },
}

/// Polling interface over the host input API.
///
/// Implemented by [`GilrsSource`] for real hardware and by in-memory
/// fakes in tests. All methods are called from the single bridge task.
pub trait InputSource {
    /// Drains pending attach/detach events since the last call.
    fn drain_events(&mut self) -> Vec<HostEvent>;

    /// Takes a fresh snapshot of one slot.
    ///
    /// Returns `None` when the slot is not currently reporting a live
    /// controller; the caller keeps the previous snapshot in that case.
    fn snapshot(&mut self, slot: SlotId) -> Option<ControllerState>;

    /// Enumerates every slot currently reporting a controller.
    ///
    /// Used by the polling fallback on hosts without native attach and
    /// detach eventing.
    fn scan(&mut self) -> Vec<(SlotId, String)>;

    /// Whether the backend delivers native attach/detach events.
    fn has_native_events(&self) -> bool;
}
