//! Brake ramp controller.
//!
//! Unlike the throttle controllers this one writes the brake scalar
//! directly: the brake channel has a single writer while enabled, so the
//! atomic store is safe and saves a queue round trip.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::SharedState;
use groundroll_engine::clock::SimClock;

use crate::controller::{Controller, WorkerSlot};

/// Ramps the brake towards 1 at `rate` per second.
pub struct BrakeController {
    state: Arc<SharedState>,
    clock: Arc<SimClock>,
    rate: f64,
    worker: WorkerSlot,
}

impl BrakeController {
    /// Create the controller with the configured ramp rate (1/s).
    pub fn new(state: Arc<SharedState>, clock: Arc<SimClock>, rate: f64) -> Self {
        Self {
            state,
            clock,
            rate,
            worker: WorkerSlot::new(),
        }
    }
}

impl Controller for BrakeController {
    fn name(&self) -> &str {
        "brake"
    }

    fn start(&self) {
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let rate = self.rate;
        self.worker.start("brake", &self.clock, move || {
            if !state.brake_control_enabled.load(Ordering::Acquire) {
                return;
            }
            let next = (state.brake.load() + rate * clock.time_step()).min(1.0);
            state.brake.store(next);
            log::debug!("[brake] brake {:.1}%", next * 100.0);
        });
        log::debug!("[brake] started");
    }

    fn stop(&self) {
        self.worker.stop();
        log::debug!("[brake] stopped");
    }

    fn is_enabled(&self) -> bool {
        self.state.brake_control_enabled.load(Ordering::Acquire)
    }

    fn current_value(&self) -> f64 {
        self.state.brake.load()
    }
}
