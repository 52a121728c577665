//! Hardware output port for the locator LEDs
//!
//! The LED controller drives lines through the [`LedBackend`] trait so the
//! same logic runs against real Raspberry Pi pins (feature `rpi`) or an
//! in-memory mock everywhere else, including tests.

use anyhow::Result;
use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

/// Output line driver. `pin` is a BCM pin number.
///
/// Methods take `&self`; implementations use interior mutability so the
/// backend can sit behind an `Arc` shared with the test-sequence task.
pub trait LedBackend: Send + Sync {
    /// Claim a pin and drive it low. Returns an error if the pin cannot be
    /// used this run.
    fn init_pin(&self, pin: u8) -> Result<()>;

    /// Drive a previously initialized pin high or low.
    fn set_level(&self, pin: u8, high: bool) -> Result<()>;
}

/// In-memory backend: records levels, never touches hardware.
///
/// Individual pins can be scripted to fail for exercising the soft-failure
/// paths.
#[derive(Default)]
pub struct MockBackend {
    levels: Mutex<HashMap<u8, bool>>,
    failing: Mutex<HashSet<u8>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a pin, if it was ever initialized
    pub fn level(&self, pin: u8) -> Option<bool> {
        self.levels.lock().get(&pin).copied()
    }

    /// Make every operation on `pin` fail from now on
    pub fn fail_pin(&self, pin: u8) {
        self.failing.lock().insert(pin);
    }

    fn check(&self, pin: u8) -> Result<()> {
        if self.failing.lock().contains(&pin) {
            anyhow::bail!("mock pin {} is scripted to fail", pin);
        }
        Ok(())
    }
}

impl LedBackend for MockBackend {
    fn init_pin(&self, pin: u8) -> Result<()> {
        self.check(pin)?;
        self.levels.lock().insert(pin, false);
        Ok(())
    }

    fn set_level(&self, pin: u8, high: bool) -> Result<()> {
        self.check(pin)?;
        self.levels.lock().insert(pin, high);
        Ok(())
    }
}

#[cfg(feature = "rpi")]
pub use rpi::RpiBackend;

#[cfg(feature = "rpi")]
mod rpi {
    use super::LedBackend;
    use anyhow::{Context, Result};
    use parking_lot::Mutex;
    use rppal::gpio::{Gpio, OutputPin};
    use std::collections::HashMap;

    /// Real GPIO backend via rppal. One `OutputPin` per claimed pin; the
    /// process is assumed to be the only owner of these lines.
    pub struct RpiBackend {
        gpio: Gpio,
        pins: Mutex<HashMap<u8, OutputPin>>,
    }

    impl RpiBackend {
        /// Open the GPIO chip. Fails on non-Pi hardware, which aborts
        /// startup before any request is served.
        pub fn new() -> Result<Self> {
            let gpio = Gpio::new().context("Failed to open GPIO chip")?;
            Ok(Self {
                gpio,
                pins: Mutex::new(HashMap::new()),
            })
        }
    }

    impl LedBackend for RpiBackend {
        fn init_pin(&self, pin: u8) -> Result<()> {
            let mut output = self
                .gpio
                .get(pin)
                .with_context(|| format!("Failed to claim GPIO pin {}", pin))?
                .into_output();
            output.set_low();
            self.pins.lock().insert(pin, output);
            Ok(())
        }

        fn set_level(&self, pin: u8, high: bool) -> Result<()> {
            let mut pins = self.pins.lock();
            let output = pins
                .get_mut(&pin)
                .with_context(|| format!("GPIO pin {} was not initialized", pin))?;
            if high {
                output.set_high();
            } else {
                output.set_low();
            }
            Ok(())
        }
    }
}
