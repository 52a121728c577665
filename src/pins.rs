//! Static drawer-to-GPIO pin assignment
//!
//! The 28 LEDs sit on a fixed list of BCM pins, consumed in row-major drawer
//! order (row 1 col 1..4, row 2 col 1..4, ...). Row 8 has no LEDs and maps
//! to no pin. The assignment is built once at startup and never changes.

use crate::drawer::DrawerId;
use std::collections::HashMap;

/// BCM pin numbers for the 28 locator LEDs, in drawer order
pub const LED_PINS: [u8; 28] = [
    2, 3, 4, 14, 15, 18, 17, 27, 22, 23, 24, 10, 9, 25, 11, 8, //
    7, 1, 12, 16, 20, 21, 19, 26, 13, 6, 5, 0,
];

/// Immutable drawer -> pin table
#[derive(Debug, Clone)]
pub struct PinMap {
    pins: HashMap<DrawerId, u8>,
}

impl PinMap {
    /// Assign `LED_PINS` to the lit drawers in canonical order
    pub fn new() -> Self {
        let pins = DrawerId::lit().zip(LED_PINS).collect();
        Self { pins }
    }

    /// Pin for a drawer, or `None` for row 8
    pub fn pin(&self, id: DrawerId) -> Option<u8> {
        self.pins.get(&id).copied()
    }

    /// Drop a pin that failed hardware initialization; the drawer then
    /// behaves as unassigned for the rest of the run.
    pub fn remove(&mut self, id: DrawerId) {
        self.pins.remove(&id);
    }

    /// Number of assigned pins
    pub fn assigned_count(&self) -> usize {
        self.pins.len()
    }

    /// Assigned (drawer, pin) pairs in canonical drawer order
    pub fn assignments(&self) -> impl Iterator<Item = (DrawerId, u8)> + '_ {
        DrawerId::lit().filter_map(|id| self.pin(id).map(|pin| (id, pin)))
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::new()
    }
}
