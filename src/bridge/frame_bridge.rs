//! Frame bridge with statum state machine for the polling loop
//!
//! Owns the tracked-controller and socket maps and drives the whole
//! system from a single task. One frame tick refreshes every tracked
//! slot's snapshot, remaps and scales it into a wire message, and
//! fire-and-forgets one text frame per slot with a live link.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Running ──► Stopped
//!    (create)      (loop)     (shutdown)
//! ```
//!
//! # Architecture
//!
//! ```text
//! InputSource ──► FrameBridge ──► LayoutRegistry ──► WireMessage ──► SlotLink
//!   (snapshots)   (tracked map)      (remap)          (encode)      (socket)
//! ```
//!
//! Attach/detach events, socket completions and frame ticks interleave
//! on the same task and each runs to completion before the next, so the
//! maps never need locking.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use statum::{machine, state};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::bridge::connection::{ConnectionManager, LinkEvent, SlotLink};
use crate::config::BridgeConfig;
use crate::input::{ControllerState, HostEvent, InputSource, SlotId};
use crate::layout::{LayoutRegistry, LayoutTable};
use crate::wire::encode_frame;

/// Errors raised by the bridge subsystem
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Error from the input backend
    #[error("Input error: {0}")]
    InputError(#[from] crate::input::InputError),

    /// Inter-task communication error
    #[error("Channel error: {0}")]
    ChannelError(String),
}

/// One tracked controller slot.
///
/// The snapshot is replaced wholesale on every successful re-poll. A slot
/// that stops reporting without a detach event keeps its last snapshot;
/// this mirrors the host gap rather than papering over it.
#[derive(Debug)]
struct TrackedController {
    identity: String,
    table: &'static LayoutTable,
    state: ControllerState,
    attached_at: DateTime<Local>,
}

/// Lifecycle states of the bridge using statum
#[state]
#[derive(Debug, Clone)]
pub enum BridgeState {
    Initializing, // Wiring up channels and the connection manager
    Running,      // Frame loop active
    Stopped,      // Shut down, sockets released
}

/// Controller-to-wire bridge with compile-time lifecycle safety via statum
///
/// Created in `Initializing`, transitioned to `Running` for the frame
/// loop, and consumed into `Stopped` on shutdown.
#[machine]
pub struct FrameBridge<S: BridgeState> {
    source: Box<dyn InputSource + Send>,
    registry: LayoutRegistry,
    config: BridgeConfig,
    connections: ConnectionManager,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
    tracked: HashMap<SlotId, TrackedController>,
    links: HashMap<SlotId, SlotLink>,
}

impl<S: BridgeState> FrameBridge<S> {
    /// Number of currently tracked controller slots.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Number of slots with an established socket.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

impl FrameBridge<Initializing> {
    pub fn create(
        source: Box<dyn InputSource + Send>,
        registry: LayoutRegistry,
        config: BridgeConfig,
    ) -> Self {
        let (events_tx, link_events) = mpsc::unbounded_channel();
        let connections = ConnectionManager::new(&config, events_tx);
        info!(
            "Creating frame bridge, receiver endpoint: {}",
            connections.endpoint()
        );

        Self::new(
            source,
            registry,
            config,
            connections,
            link_events,
            HashMap::new(), // tracked
            HashMap::new(), // links
        )
    }

    /// Transitions to Running; the frame loop may then be started.
    pub fn initialize(self) -> FrameBridge<Running> {
        info!(
            "Frame bridge initialized: {} registered layouts, {}ms frame interval",
            self.registry.len(),
            self.config.bridge.frame_interval_ms
        );
        self.transition()
    }
}

impl FrameBridge<Running> {
    /// Handles one host attach event.
    ///
    /// Unknown identities cause no transition at all: no socket is
    /// opened and no tracking entry is created.
    fn attach(&mut self, slot: SlotId, identity: String) {
        if self.tracked.contains_key(&slot) {
            debug!("Slot {} already tracked, ignoring attach", slot);
            return;
        }

        let Some(table) = self.registry.lookup(&identity) else {
            info!("Ignoring unsupported controller in slot {}: {}", slot, identity);
            return;
        };

        info!("Tracking controller in slot {}: {}", slot, identity);
        let state = self.source.snapshot(slot).unwrap_or_else(|| ControllerState {
            identity: identity.clone(),
            buttons: Vec::new(),
            axes: Vec::new(),
        });
        self.tracked.insert(
            slot,
            TrackedController {
                identity: identity.clone(),
                table,
                state,
                attached_at: Local::now(),
            },
        );
        self.connections.open(slot, identity);
    }

    /// Handles one host detach event: the socket is closed and the slot
    /// is removed from both maps. The next frame finds the slot absent.
    fn detach(&mut self, slot: SlotId) {
        if let Some(tracked) = self.tracked.remove(&slot) {
            info!(
                "Untracking controller in slot {} ({}, attached {})",
                slot,
                tracked.identity,
                tracked.attached_at.format("%H:%M:%S")
            );
        }
        // Dropping the link closes the socket via its writer task
        self.links.remove(&slot);
    }

    fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Opened { slot, link } => {
                if self.tracked.contains_key(&slot) {
                    info!("Socket established for slot {}", slot);
                    self.links.insert(slot, link);
                } else {
                    // Detached while the open was in flight
                    debug!("Discarding socket for untracked slot {}", slot);
                }
            }
            LinkEvent::Failed { slot, reason } => {
                // No retry: the slot stays tracked without a usable socket
                warn!("Socket for slot {} unavailable: {}", slot, reason);
            }
            LinkEvent::Closed { slot } => {
                debug!("Socket for slot {} closed", slot);
                self.links.remove(&slot);
            }
        }
    }

    /// One frame tick: drain host events, refresh snapshots, encode and
    /// transmit. Returns the number of frames sent.
    fn run_frame(&mut self) -> usize {
        for event in self.source.drain_events() {
            match event {
                HostEvent::Attached { slot, identity } => self.attach(slot, identity),
                HostEvent::Detached { slot } => self.detach(slot),
            }
        }

        // Slots not currently reporting retain their last snapshot
        for (slot, tracked) in self.tracked.iter_mut() {
            if let Some(state) = self.source.snapshot(*slot) {
                tracked.state = state;
            }
        }

        let mut sent = 0;
        for (slot, tracked) in &self.tracked {
            let Some(link) = self.links.get(slot) else {
                trace!("No socket for slot {}, skipping frame", slot);
                continue;
            };

            let message = encode_frame(&tracked.state, tracked.table);
            match serde_json::to_string(&message) {
                Ok(payload) => {
                    // Fire-and-forget; a dead link is cleaned up by its
                    // Closed event, not here
                    if link.send_text(payload) {
                        sent += 1;
                    }
                }
                Err(e) => error!("Failed to encode frame for slot {}: {}", slot, e),
            }
        }
        sent
    }

    /// Synthesizes attach transitions for newly reporting slots.
    ///
    /// Used on hosts without native attach/detach events. Detach is never
    /// synthesized in this mode, so a silently removed controller keeps
    /// streaming its last known state.
    fn scan(&mut self) {
        for (slot, identity) in self.source.scan() {
            if !self.tracked.contains_key(&slot) {
                self.attach(slot, identity);
            }
        }
    }

    /// Main polling loop with graceful shutdown support.
    ///
    /// Frame ticks, fallback scans and socket completions interleave on
    /// this task; each branch runs to completion before the next.
    pub async fn run_until_shutdown(mut self, shutdown: CancellationToken) -> FrameBridge<Stopped> {
        let frame_interval =
            std::time::Duration::from_millis(self.config.bridge.frame_interval_ms.max(1));
        let scan_interval =
            std::time::Duration::from_millis(self.config.bridge.scan_interval_ms.max(1));
        let polling_fallback =
            self.config.bridge.force_polling || !self.source.has_native_events();

        let mut frame_tick = tokio::time::interval(frame_interval);
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut scan_tick = tokio::time::interval(scan_interval);
        scan_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if polling_fallback {
            warn!(
                "No native attach/detach events, re-scanning every {}ms (detach is never synthesized)",
                self.config.bridge.scan_interval_ms
            );
        }
        info!("Starting frame loop at {}ms per tick", frame_interval.as_millis());

        let mut frames: u64 = 0;
        let mut sends: u64 = 0;
        let mut last_stats = Local::now();
        let stats_interval = chrono::Duration::seconds(10);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping frame loop");
                    break;
                }

                Some(event) = self.link_events.recv() => {
                    self.handle_link_event(event);
                }

                _ = scan_tick.tick(), if polling_fallback => {
                    self.scan();
                }

                _ = frame_tick.tick() => {
                    sends += self.run_frame() as u64;
                    frames += 1;

                    let now = Local::now();
                    if now - last_stats > stats_interval {
                        info!(
                            "Frame loop stats: {} ticks, {} frames sent, {} tracked, {} connected",
                            frames, sends, self.tracked.len(), self.links.len()
                        );
                        frames = 0;
                        sends = 0;
                        last_stats = now;
                    }
                }
            }
        }

        // Dropping the links closes every socket
        self.links.clear();
        self.tracked.clear();
        info!("Frame bridge stopped");
        self.transition()
    }
}

impl FrameBridge<Stopped> {}

/// Handle for running the bridge subsystem in a tokio task
///
/// Builds the gilrs-backed source, wires it to the bridge and spawns the
/// frame loop. The task runs until the cancellation token fires.
pub struct BridgeHandle {}

impl BridgeHandle {
    pub fn spawn(
        config: BridgeConfig,
        registry: LayoutRegistry,
        shutdown: CancellationToken,
    ) -> Result<tokio::task::JoinHandle<()>, BridgeError> {
        let source = crate::input::GilrsSource::new()?;
        let bridge = FrameBridge::create(Box::new(source), registry, config).initialize();

        Ok(tokio::spawn(async move {
            let _stopped = bridge.run_until_shutdown(shutdown).await;
        }))
    }
}
