//! LED controller - in-memory LED state plus hardware writes
//!
//! Owns the per-drawer on/off map and the pin assignment, and drives the
//! lines through an [`LedBackend`]. State lives for the process only; every
//! start comes up all-off.

use crate::drawer::DrawerId;
use crate::gpio::LedBackend;
use crate::pins::PinMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long each LED stays on during the chase
const TEST_STEP: Duration = Duration::from_millis(150);
/// Pause between test phases
const TEST_PAUSE: Duration = Duration::from_millis(500);
/// How long all LEDs stay on at the end of the test
const TEST_ALL_ON: Duration = Duration::from_secs(1);

/// LED operation failures surfaced to callers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedError {
    /// Drawer exists but has no LED wired (row 8, or a pin dropped at init)
    #[error("Érvénytelen fiók ID")]
    NoPinAssigned,
    /// A test sequence is already running
    #[error("LED teszt már fut")]
    TestInProgress,
}

/// Shared LED engine. Cheap to clone behind an `Arc`; the test sequence task
/// and the HTTP handlers all hold the same instance.
pub struct LedController {
    pin_map: PinMap,
    led_state: RwLock<HashMap<DrawerId, bool>>,
    backend: Arc<dyn LedBackend>,
    test_running: AtomicBool,
    test_cancel: AtomicBool,
}

impl LedController {
    /// Initialize every assigned pin as a low output through the backend.
    ///
    /// A pin that fails to initialize is logged and dropped from the map;
    /// its drawer behaves as unassigned for this run.
    pub fn new(backend: Arc<dyn LedBackend>) -> Self {
        let mut pin_map = PinMap::new();

        let mut failed = Vec::new();
        for (id, pin) in pin_map.assignments() {
            if let Err(e) = backend.init_pin(pin) {
                warn!("Failed to initialize GPIO {} for drawer {}: {:#}", pin, id, e);
                failed.push(id);
            }
        }
        for id in failed {
            pin_map.remove(id);
        }

        let led_state = DrawerId::all().map(|id| (id, false)).collect();

        info!("{} LEDs configured", pin_map.assigned_count());

        Self {
            pin_map,
            led_state: RwLock::new(led_state),
            backend,
            test_running: AtomicBool::new(false),
            test_cancel: AtomicBool::new(false),
        }
    }

    /// Drive one drawer's LED. Fails only for drawers without an assigned
    /// pin; a hardware write error is logged and swallowed, leaving the
    /// recorded state untouched.
    pub fn set(&self, id: DrawerId, desired: bool) -> Result<(), LedError> {
        let pin = self.pin_map.pin(id).ok_or(LedError::NoPinAssigned)?;

        match self.backend.set_level(pin, desired) {
            Ok(()) => {
                self.led_state.write().insert(id, desired);
                debug!("LED {} (GPIO {}) -> {}", id, pin, if desired { "on" } else { "off" });
            }
            Err(e) => {
                warn!("GPIO write failed for drawer {} (pin {}): {:#}", id, pin, e);
            }
        }
        Ok(())
    }

    /// Flip a drawer's LED and report the state after the attempt
    pub fn toggle(&self, id: DrawerId) -> Result<bool, LedError> {
        let desired = !self.state_of(id);
        self.set(id, desired)?;
        Ok(self.state_of(id))
    }

    /// Best-effort sweep over every assigned drawer. Cancels a running test
    /// sequence first so a manual bulk command is not fought by the chase.
    pub fn set_all(&self, desired: bool) {
        self.cancel_test();
        for (id, _) in self.pin_map.assignments() {
            // Assigned by construction, so set() cannot fail here
            let _ = self.set(id, desired);
        }
    }

    /// Recorded state of one drawer (false for unknown/unassigned)
    pub fn state_of(&self, id: DrawerId) -> bool {
        self.led_state.read().get(&id).copied().unwrap_or(false)
    }

    /// Full id -> state map for the status endpoint
    pub fn snapshot(&self) -> HashMap<String, bool> {
        self.led_state
            .read()
            .iter()
            .map(|(id, on)| (id.to_string(), *on))
            .collect()
    }

    /// Number of drawers with a working LED
    pub fn lit_count(&self) -> usize {
        self.pin_map.assigned_count()
    }

    /// Whether a test sequence is currently running
    pub fn test_running(&self) -> bool {
        self.test_running.load(Ordering::SeqCst)
    }

    /// Ask a running test sequence to stop at its next step
    pub fn cancel_test(&self) {
        if self.test_running() {
            self.test_cancel.store(true, Ordering::SeqCst);
        }
    }

    /// Start the diagnostic chase in a background task and return
    /// immediately. At most one sequence runs at a time; a second request is
    /// rejected instead of racing the first.
    pub fn start_test(self: Arc<Self>) -> Result<(), LedError> {
        if self
            .test_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LedError::TestInProgress);
        }
        self.test_cancel.store(false, Ordering::SeqCst);

        tokio::spawn(async move {
            self.run_test_sequence().await;
            self.test_running.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// All off, chase each LED in row-major order, all on, all off.
    ///
    /// Cancellation is checked between steps; once seen, the sequence stops
    /// without touching any further LEDs so a superseding command (the
    /// `set_all` that cancelled it) keeps the final word.
    async fn run_test_sequence(&self) {
        info!("LED test sequence started");

        self.sweep(false);
        tokio::time::sleep(TEST_PAUSE).await;

        for (id, _) in self.pin_map.assignments() {
            if self.cancelled() {
                return;
            }
            let _ = self.set(id, true);
            tokio::time::sleep(TEST_STEP).await;
            let _ = self.set(id, false);
        }

        tokio::time::sleep(TEST_PAUSE).await;
        if self.cancelled() {
            return;
        }

        self.sweep(true);
        tokio::time::sleep(TEST_ALL_ON).await;
        if self.cancelled() {
            return;
        }
        self.sweep(false);

        info!("LED test sequence finished");
    }

    /// Like `set_all` but without the self-cancellation, for use inside the
    /// test sequence itself
    fn sweep(&self, desired: bool) {
        for (id, _) in self.pin_map.assignments() {
            let _ = self.set(id, desired);
        }
    }

    fn cancelled(&self) -> bool {
        if self.test_cancel.load(Ordering::SeqCst) {
            info!("LED test sequence cancelled");
            true
        } else {
            false
        }
    }

    /// Assigned (drawer, pin) pairs, for the startup banner
    pub fn assignments(&self) -> impl Iterator<Item = (DrawerId, u8)> + '_ {
        self.pin_map.assignments()
    }
}
