//! End-to-end test against a real WebSocket acceptor: the identity
//! handshake must be the first frame on the socket, strictly before any
//! per-frame update, and updates must carry the remapped, scaled values.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use padbridge::bridge::FrameBridge;
use padbridge::config::BridgeConfig;
use padbridge::input::{ButtonReading, ControllerState, HostEvent, InputSource, SlotId};
use padbridge::layout::LayoutRegistry;
use padbridge::wire::WireMessage;

const XBOX_IDENTITY: &str =
    "Xbox Wireless Controller (STANDARD GAMEPAD Vendor: 045e Product: 02fd)";

struct ScriptedSource {
    events: Arc<Mutex<Vec<HostEvent>>>,
    states: HashMap<SlotId, ControllerState>,
}

impl InputSource for ScriptedSource {
    fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }

    fn snapshot(&mut self, slot: SlotId) -> Option<ControllerState> {
        self.states.get(&slot).cloned()
    }

    fn scan(&mut self) -> Vec<(SlotId, String)> {
        Vec::new()
    }

    fn has_native_events(&self) -> bool {
        true
    }
}

fn xbox_snapshot() -> ControllerState {
    let mut buttons = vec![ButtonReading::from_value(0.0); 17];
    buttons[3] = ButtonReading::from_value(1.0);
    ControllerState {
        identity: XBOX_IDENTITY.to_string(),
        buttons,
        axes: vec![-0.5, 0.0, 0.0, 0.0],
    }
}

#[tokio::test]
async fn identity_handshake_strictly_precedes_update_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = BridgeConfig::default();
    config.server.port = port;
    config.bridge.frame_interval_ms = 5;

    let events = Arc::new(Mutex::new(vec![HostEvent::Attached {
        slot: 0,
        identity: XBOX_IDENTITY.to_string(),
    }]));
    let mut states = HashMap::new();
    states.insert(0, xbox_snapshot());
    let source = ScriptedSource { events, states };

    let shutdown = CancellationToken::new();
    let bridge = FrameBridge::create(Box::new(source), LayoutRegistry::new(), config).initialize();
    let token = shutdown.clone();
    let bridge_task = tokio::spawn(async move {
        let _ = bridge.run_until_shutdown(token).await;
    });

    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("bridge never connected")
        .unwrap();
    let mut socket = accept_async(stream).await.unwrap();

    // First frame: the raw identity string, verbatim
    let first = timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("no handshake frame")
        .unwrap()
        .unwrap();
    assert_eq!(first, Message::Text(XBOX_IDENTITY.to_string()));

    // Second frame: a JSON update with remapped, floor-scaled values
    let second = loop {
        let frame = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("no update frame")
            .unwrap()
            .unwrap();
        if let Message::Text(payload) = frame {
            break payload;
        }
    };
    let message: WireMessage = serde_json::from_str(&second).unwrap();
    assert_eq!(message.buttons.len(), 17);
    assert_eq!(message.buttons[3], Some(255));
    assert_eq!(message.axes[0], -16384);
    assert_eq!(message.axes.len(), 4);

    shutdown.cancel();
    let _ = bridge_task.await;
}

#[tokio::test]
async fn detached_controller_closes_its_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = BridgeConfig::default();
    config.server.port = port;
    config.bridge.frame_interval_ms = 5;

    let events = Arc::new(Mutex::new(vec![HostEvent::Attached {
        slot: 0,
        identity: XBOX_IDENTITY.to_string(),
    }]));
    let mut states = HashMap::new();
    states.insert(0, xbox_snapshot());
    let source = ScriptedSource {
        events: events.clone(),
        states,
    };

    let shutdown = CancellationToken::new();
    let bridge = FrameBridge::create(Box::new(source), LayoutRegistry::new(), config).initialize();
    let token = shutdown.clone();
    let bridge_task = tokio::spawn(async move {
        let _ = bridge.run_until_shutdown(token).await;
    });

    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("bridge never connected")
        .unwrap();
    let mut socket = accept_async(stream).await.unwrap();

    // Swallow the handshake, then detach the controller
    let _ = timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("no handshake frame");
    events.lock().unwrap().push(HostEvent::Detached { slot: 0 });

    // The stream ends with a close once the pending frames drain
    let closed = timeout(Duration::from_secs(5), async {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                _ => continue,
            }
        }
        true
    })
    .await
    .expect("socket never closed after detach");
    assert!(closed);

    shutdown.cancel();
    let _ = bridge_task.await;
}
