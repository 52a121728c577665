//! Electronics Storage - drawer inventory with GPIO LED locator
//!
//! Web application for a 32-drawer parts cabinet: a browser UI edits and
//! searches drawer contents, and 28 GPIO-attached LEDs (rows 1-7 of the
//! 8x4 grid) light up to physically locate a drawer.

pub mod api;
pub mod drawer;
pub mod gpio;
pub mod leds;
pub mod pins;
pub mod store;

pub use api::{ApiState, DEFAULT_PORT};
pub use drawer::{DrawerDocument, DrawerId, DrawerRecord};
pub use gpio::{LedBackend, MockBackend};
pub use leds::{LedController, LedError};
pub use store::DrawerStore;
