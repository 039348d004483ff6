use std::collections::HashMap;

use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use tracing::{debug, info, warn};

use super::{ButtonReading, ControllerState, HostEvent, InputError, InputSource, SlotId};

/// Physical button order of the Standard Gamepad layout.
///
/// Snapshot indices follow this order, so the registry tables written
/// against browser-reported devices apply unchanged to native ones.
const STANDARD_BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// Physical axis order of the Standard Gamepad layout.
const STANDARD_AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// gilrs-backed [`InputSource`] for native hosts.
///
/// Identities are reported in the Standard Gamepad reporting-string
/// format (`"<name> (STANDARD GAMEPAD Vendor: vvvv Product: pppp)"`),
/// which is what the layout registry is keyed on.
pub struct GilrsSource {
    gilrs: Gilrs,
    slots: HashMap<SlotId, GamepadId>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, InputError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                warn!("Failed to initialize gilrs: {}", e);
                return Err(InputError::InitializationError(e.to_string()));
            }
        };

        Ok(Self {
            gilrs,
            slots: HashMap::new(),
        })
    }

    fn identity_of(gamepad: &Gamepad<'_>) -> String {
        format!(
            "{} (STANDARD GAMEPAD Vendor: {:04x} Product: {:04x})",
            gamepad.name(),
            gamepad.vendor_id().unwrap_or(0),
            gamepad.product_id().unwrap_or(0)
        )
    }

    fn take_snapshot(gamepad: &Gamepad<'_>) -> ControllerState {
        let buttons = STANDARD_BUTTONS
            .iter()
            .map(|&button| match gamepad.button_data(button) {
                Some(data) => ButtonReading {
                    value: data.value(),
                    pressed: data.is_pressed(),
                    touched: false,
                },
                None => ButtonReading::from_value(0.0),
            })
            .collect();

        // gilrs reports stick Y as up-positive; the wire convention is
        // down-positive, so the vertical axes are negated here.
        let axes = STANDARD_AXES
            .iter()
            .map(|&axis| {
                let value = gamepad
                    .axis_data(axis)
                    .map(|data| data.value())
                    .unwrap_or(0.0);
                match axis {
                    Axis::LeftStickY | Axis::RightStickY => -value,
                    _ => value,
                }
            })
            .collect();

        ControllerState {
            identity: Self::identity_of(gamepad),
            buttons,
            axes,
        }
    }
}

impl InputSource for GilrsSource {
    fn drain_events(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            let slot: SlotId = usize::from(id);
            match event {
                EventType::Connected => {
                    self.slots.insert(slot, id);
                    let identity = Self::identity_of(&self.gilrs.gamepad(id));
                    info!("Controller attached in slot {}: {}", slot, identity);
                    events.push(HostEvent::Attached { slot, identity });
                }
                EventType::Disconnected => {
                    info!("Controller detached from slot {}", slot);
                    events.push(HostEvent::Detached { slot });
                }
                // Button and axis activity is picked up by the per-frame
                // snapshot, not the event stream.
                _ => debug!("Ignoring gilrs event in slot {}: {:?}", slot, event),
            }
        }
        events
    }

    fn snapshot(&mut self, slot: SlotId) -> Option<ControllerState> {
        let id = *self.slots.get(&slot)?;
        let gamepad = self.gilrs.connected_gamepad(id)?;
        Some(Self::take_snapshot(&gamepad))
    }

    fn scan(&mut self) -> Vec<(SlotId, String)> {
        let mut present = Vec::new();
        for (id, gamepad) in self.gilrs.gamepads() {
            let slot: SlotId = usize::from(id);
            self.slots.insert(slot, id);
            present.push((slot, Self::identity_of(&gamepad)));
        }
        present
    }

    fn has_native_events(&self) -> bool {
        true
    }
}
