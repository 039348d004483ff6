//! Layout registry for known controller models
//!
//! Maps the host-reported identity string of a controller onto a remap
//! table that translates physical button indices into canonical logical
//! slots. The identity string encodes vendor/product metadata and differs
//! between host environments, so the same physical device needs one entry
//! per reporting string (Chrome and Safari report differently).
//!
//! A controller whose identity is not in the registry is never tracked:
//! attach events for unknown identities are silently ignored.

use tracing::debug;

/// Number of logical button slots in the canonical output layout.
pub const LOGICAL_SLOT_COUNT: usize = 18;

/// Remap table: `table[physical_index] = logical_slot`.
///
/// Table length equals the device's physical button count. Entries are
/// trusted to be in range; the registry is the single place they are
/// defined.
pub type LayoutTable = [usize];

// Chrome reporting strings
static XBOX_WIRELESS: &[usize] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
static PRO_CONTROLLER: &[usize] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17,
];
static WIRELESS_GAMEPAD: &[usize] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17,
];

// Safari reporting strings
static XBOX_WIRELESS_EXTENDED: &[usize] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17,
];
static PRO_CONTROLLER_EXTENDED: &[usize] = &[
    1, 0, 3, 2, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17,
];

static KNOWN_LAYOUTS: &[(&str, &LayoutTable)] = &[
    (
        "Xbox Wireless Controller (STANDARD GAMEPAD Vendor: 045e Product: 02fd)",
        XBOX_WIRELESS,
    ),
    (
        "Pro Controller (STANDARD GAMEPAD Vendor: 057e Product: 2009)",
        PRO_CONTROLLER,
    ),
    (
        "Wireless Gamepad (STANDARD GAMEPAD Vendor: 057e Product: 2009)",
        WIRELESS_GAMEPAD,
    ),
    (
        "Xbox Wireless Controller Extended Gamepad",
        XBOX_WIRELESS_EXTENDED,
    ),
    ("Pro Controller Extended Gamepad", PRO_CONTROLLER_EXTENDED),
];

/// Registry of supported controller layouts.
///
/// Lookup is exact string equality against the host-reported identity.
/// No two entries alias each other.
#[derive(Clone, Debug, Default)]
pub struct LayoutRegistry {}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self {}
    }

    /// Resolves an identity string to its remap table, if the device is known.
    pub fn lookup(&self, identity: &str) -> Option<&'static LayoutTable> {
        let found = KNOWN_LAYOUTS
            .iter()
            .find(|(known, _)| *known == identity)
            .map(|(_, table)| *table);
        if found.is_none() {
            debug!("No layout registered for identity: {:?}", identity);
        }
        found
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        KNOWN_LAYOUTS.len()
    }

    pub fn is_empty(&self) -> bool {
        KNOWN_LAYOUTS.is_empty()
    }

    /// Iterates over all registered identities and their tables.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &'static LayoutTable)> {
        KNOWN_LAYOUTS.iter().copied()
    }
}
