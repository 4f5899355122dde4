//! The controller capability contract and shared worker plumbing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use groundroll_engine::clock::{run_synced, SimClock};

/// Capability set every control loop exposes.
///
/// Controllers are started and stopped by the manager in response to
/// scenario events; `is_enabled` reflects the per-controller enable flag
/// in the shared state, which gates the per-tick body independently of
/// whether the worker thread is running.
pub trait Controller: Send + Sync {
    /// Stable controller name, as referenced by action configs.
    fn name(&self) -> &str;

    /// Spawn the worker thread. Idempotent while running.
    fn start(&self);

    /// Stop the worker thread and join it. Idempotent while stopped.
    fn stop(&self);

    /// Whether the controller's enable flag is set in the shared state.
    fn is_enabled(&self) -> bool;

    /// The controller's current output (throttle, brake, pitch output…).
    fn current_value(&self) -> f64;
}

/// Per-tick rate parameters for the simple ramp controllers, fed from
/// scenario config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerRates {
    /// Throttle increase per second.
    pub throttle_increase_rate: f64,
    /// Throttle decrease per second.
    pub throttle_decrease_rate: f64,
    /// Brake increase per second.
    pub brake_rate: f64,
    /// Proportional gain of the runway cruise law.
    pub cruise_gain: f64,
}

impl Default for ControllerRates {
    fn default() -> Self {
        Self {
            throttle_increase_rate: 0.1,
            throttle_decrease_rate: 0.2,
            brake_rate: 0.2,
            cruise_gain: 0.1,
        }
    }
}

/// Worker-thread handle shared by all controllers: a running flag and a
/// joinable thread slot.
pub(crate) struct WorkerSlot {
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerSlot {
    pub(crate) fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Spawn a clock-synced worker running `tick` each step. Returns
    /// without doing anything if the worker is already running.
    pub(crate) fn start<F>(&self, thread_name: &str, clock: &Arc<SimClock>, tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let clock = Arc::clone(clock);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                run_synced(&clock, &running, tick);
                // Let a later start() respawn after the clock stopped us.
                running.store(false, Ordering::Release);
            })
            .expect("spawn controller thread");
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Clear the running flag and join the worker, if any.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
