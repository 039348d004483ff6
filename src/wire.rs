//! Wire format for per-frame controller updates
//!
//! Every frame each attached controller produces one JSON text frame:
//!
//! ```text
//! {"buttons": [255, 0, null, ...], "axes": [-16384, 0, ...]}
//! ```
//!
//! Buttons are indexed by logical slot after remapping and may be sparse;
//! a logical slot no physical button maps to serializes as `null`, which
//! the receiver treats as "not present" rather than "0% pressed". Axes
//! are indexed by physical axis index and are always dense.
//!
//! The first frame on any socket is not a [`WireMessage`] but the raw
//! identity string of the controller, sent verbatim as the handshake.

use serde::{Deserialize, Serialize};

use crate::input::ControllerState;
use crate::layout::LayoutTable;

/// Fixed-point scale for button values, the unsigned byte range.
pub const BUTTON_SCALE: f64 = 255.0;

/// Fixed-point scale for axis values, the positive half of an `i16`.
pub const AXIS_SCALE: f64 = 32767.0;

/// One per-frame update, constructed and sent every tick, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub buttons: Vec<Option<u8>>,
    pub axes: Vec<i16>,
}

/// Scales a raw button value in `[0, 1]` to the byte range.
///
/// Truncating, not rounding: `floor(value * 255)`.
pub fn scale_button(value: f32) -> u8 {
    (f64::from(value) * BUTTON_SCALE).floor().clamp(0.0, 255.0) as u8
}

/// Scales a raw axis value in `[-1, 1]` to the signed 16-bit range.
///
/// Floor, not round-to-nearest, so negative values truncate toward
/// negative infinity: `floor(-0.5 * 32767) = -16384`.
pub fn scale_axis(value: f32) -> i16 {
    (f64::from(value) * AXIS_SCALE)
        .floor()
        .clamp(-AXIS_SCALE, AXIS_SCALE) as i16
}

/// Encodes one controller snapshot into a wire message.
///
/// Button values land at `buttons[table[physical]]`; physical indices
/// beyond the table are dropped. Axes pass through by physical index,
/// no remapping.
pub fn encode_frame(state: &ControllerState, table: &LayoutTable) -> WireMessage {
    let mut buttons: Vec<Option<u8>> = Vec::with_capacity(state.buttons.len());
    for (physical, reading) in state.buttons.iter().enumerate() {
        let Some(&slot) = table.get(physical) else {
            continue;
        };
        if buttons.len() <= slot {
            buttons.resize(slot + 1, None);
        }
        buttons[slot] = Some(scale_button(reading.value));
    }

    let axes = state.axes.iter().map(|&value| scale_axis(value)).collect();

    WireMessage { buttons, axes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonReading;
    use crate::layout::LayoutRegistry;

    fn state_with(identity: &str, buttons: &[f32], axes: &[f32]) -> ControllerState {
        ControllerState {
            identity: identity.to_string(),
            buttons: buttons
                .iter()
                .map(|&value| ButtonReading::from_value(value))
                .collect(),
            axes: axes.to_vec(),
        }
    }

    #[test]
    fn button_scaling_floors_into_byte_range() {
        assert_eq!(scale_button(0.0), 0);
        assert_eq!(scale_button(1.0), 255);
        assert_eq!(scale_button(0.2), 51);
        assert_eq!(scale_button(0.8), 204);
        // floor, not round
        assert_eq!(scale_button(0.999), 254);
        // out-of-contract values still clamp into range
        assert_eq!(scale_button(1.5), 255);
        assert_eq!(scale_button(-0.1), 0);
    }

    #[test]
    fn axis_scaling_floors_toward_negative_infinity() {
        assert_eq!(scale_axis(0.0), 0);
        assert_eq!(scale_axis(1.0), 32767);
        assert_eq!(scale_axis(-1.0), -32767);
        // asymmetric truncation: floor(-16383.5) = -16384
        assert_eq!(scale_axis(-0.5), -16384);
        assert_eq!(scale_axis(0.5), 16383);
        assert_eq!(scale_axis(2.0), 32767);
        assert_eq!(scale_axis(-2.0), -32767);
    }

    #[test]
    fn xbox_scenario_maps_button_three_and_axis_zero() {
        let registry = LayoutRegistry::new();
        let identity = "Xbox Wireless Controller (STANDARD GAMEPAD Vendor: 045e Product: 02fd)";
        let table = registry.lookup(identity).unwrap();

        let mut buttons = vec![0.0; 17];
        buttons[3] = 1.0;
        let state = state_with(identity, &buttons, &[-0.5, 0.0, 0.0, 0.0]);

        let msg = encode_frame(&state, table);
        assert_eq!(msg.buttons[table[3]], Some(255));
        assert_eq!(msg.axes[0], -16384);
    }

    #[test]
    fn safari_pro_controller_scenario_swaps_slots() {
        let registry = LayoutRegistry::new();
        let table = registry.lookup("Pro Controller Extended Gamepad").unwrap();

        let mut buttons = vec![0.0; 18];
        buttons[0] = 0.2;
        buttons[1] = 0.8;
        let state = state_with("Pro Controller Extended Gamepad", &buttons, &[]);

        let msg = encode_frame(&state, table);
        assert_eq!(msg.buttons[1], Some(51));
        assert_eq!(msg.buttons[0], Some(204));
    }

    #[test]
    fn axes_pass_through_by_physical_index() {
        let registry = LayoutRegistry::new();
        let table = registry.lookup("Pro Controller Extended Gamepad").unwrap();
        let state = state_with("Pro Controller Extended Gamepad", &[], &[0.25, -0.25, 1.0, -1.0]);

        let msg = encode_frame(&state, table);
        assert_eq!(
            msg.axes,
            vec![
                scale_axis(0.25),
                scale_axis(-0.25),
                scale_axis(1.0),
                scale_axis(-1.0)
            ]
        );
    }

    #[test]
    fn unset_logical_slots_serialize_as_null() {
        // A two-button device remapping onto slots 2 and 0 leaves slot 1 unset.
        let table: &[usize] = &[2, 0];
        let state = state_with("test", &[1.0, 0.5], &[]);

        let msg = encode_frame(&state, table);
        assert_eq!(msg.buttons, vec![Some(127), None, Some(255)]);

        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"buttons":[127,null,255],"axes":[]}"#);
    }

    #[test]
    fn physical_buttons_beyond_the_table_are_dropped() {
        let table: &[usize] = &[0];
        let state = state_with("test", &[1.0, 1.0, 1.0], &[]);

        let msg = encode_frame(&state, table);
        assert_eq!(msg.buttons, vec![Some(255)]);
    }

    #[test]
    fn wire_message_round_trips_through_json() {
        let msg = WireMessage {
            buttons: vec![Some(255), None, Some(0)],
            axes: vec![-16384, 32767],
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: WireMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
