//! Per-controller socket lifecycle
//!
//! Each recognized controller gets exactly one outbound WebSocket
//! connection attempt per attach. The open completes asynchronously: the
//! identity handshake is the first frame on the socket, and only after it
//! is written does the bridge loop receive a [`LinkEvent::Opened`] with
//! the usable [`SlotLink`]. A failed or refused open surfaces as
//! [`LinkEvent::Failed`]; no retry is made, the slot simply stays tracked
//! without a link.
//!
//! Socket completions never touch bridge state directly. They re-enter
//! the single bridge task as messages on the link-event channel, so every
//! state transition runs atomically with respect to the frame tick.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::input::SlotId;

/// Completion events from socket tasks, consumed by the bridge loop.
#[derive(Debug)]
pub enum LinkEvent {
    /// Socket reached open state and the identity handshake was sent
    Opened { slot: SlotId, link: SlotLink },
    /// The open attempt failed; the slot stays tracked without a link
    Failed { slot: SlotId, reason: String },
    /// An established socket was closed by either side
    Closed { slot: SlotId },
}

/// Outgoing half of one controller's established socket.
///
/// Frames are fire-and-forget: a send either enqueues immediately or the
/// frame is dropped because the writer task is gone. Dropping the link
/// closes the socket.
#[derive(Debug)]
pub struct SlotLink {
    frames: mpsc::UnboundedSender<Message>,
}

impl SlotLink {
    pub(crate) fn new(frames: mpsc::UnboundedSender<Message>) -> Self {
        Self { frames }
    }

    /// Enqueues one text frame. Returns false when the socket is gone;
    /// the caller treats that the same as having no link at all.
    pub fn send_text(&self, payload: String) -> bool {
        self.frames.send(Message::Text(payload)).is_ok()
    }
}

/// Opens and supervises one socket per recognized controller slot.
pub struct ConnectionManager {
    endpoint: String,
    connect_timeout: Option<Duration>,
    events: mpsc::UnboundedSender<LinkEvent>,
}

impl ConnectionManager {
    pub fn new(config: &BridgeConfig, events: mpsc::UnboundedSender<LinkEvent>) -> Self {
        Self {
            endpoint: config.server.endpoint(),
            connect_timeout: config.bridge.connect_timeout_ms.map(Duration::from_millis),
            events,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Issues the single outbound connection attempt for an attach.
    ///
    /// The task sends the identity string as the first frame, publishes
    /// the link back through the event channel, then drains outgoing
    /// frames until the link is dropped or the peer hangs up.
    pub fn open(&self, slot: SlotId, identity: String) {
        let endpoint = self.endpoint.clone();
        let timeout = self.connect_timeout;
        let events = self.events.clone();

        info!("Opening socket for slot {} to {}", slot, endpoint);
        tokio::spawn(async move {
            let attempt = connect_async(&endpoint);
            let connected = match timeout {
                Some(limit) => match tokio::time::timeout(limit, attempt).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("Socket open for slot {} timed out after {:?}", slot, limit);
                        let _ = events.send(LinkEvent::Failed {
                            slot,
                            reason: format!("connect timed out after {limit:?}"),
                        });
                        return;
                    }
                },
                None => attempt.await,
            };

            let (socket, _) = match connected {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Socket open for slot {} failed: {}", slot, e);
                    let _ = events.send(LinkEvent::Failed {
                        slot,
                        reason: e.to_string(),
                    });
                    return;
                }
            };

            let (mut sink, mut stream) = socket.split();

            // Handshake: the identity string, strictly before any update frame
            if let Err(e) = sink.send(Message::Text(identity.clone())).await {
                warn!("Handshake for slot {} failed: {}", slot, e);
                let _ = events.send(LinkEvent::Failed {
                    slot,
                    reason: e.to_string(),
                });
                return;
            }
            debug!("Handshake sent for slot {}: {}", slot, identity);

            let (frames_tx, mut frames_rx) = mpsc::unbounded_channel();
            if events
                .send(LinkEvent::Opened {
                    slot,
                    link: SlotLink::new(frames_tx),
                })
                .is_err()
            {
                return;
            }

            loop {
                tokio::select! {
                    outgoing = frames_rx.recv() => match outgoing {
                        Some(frame) => {
                            if let Err(e) = sink.send(frame).await {
                                debug!("Send on slot {} failed: {}", slot, e);
                                break;
                            }
                        }
                        // Link dropped by the bridge: detach, close the socket
                        None => {
                            let _ = sink.send(Message::Close(None)).await;
                            break;
                        }
                    },
                    incoming = stream.next() => match incoming {
                        // The receiver may echo the handshake; nothing to do
                        Some(Ok(frame)) => debug!("Ignoring frame from receiver on slot {}: {:?}", slot, frame),
                        Some(Err(e)) => {
                            debug!("Socket for slot {} errored: {}", slot, e);
                            break;
                        }
                        None => {
                            debug!("Socket for slot {} closed by receiver", slot);
                            break;
                        }
                    },
                }
            }

            let _ = events.send(LinkEvent::Closed { slot });
        });
    }
}
