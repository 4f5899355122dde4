//! Runway cruise controller.
//!
//! A proportional law that splits its output across the two channels:
//! positive speed error commands throttle (brake released), negative
//! error commands brake (throttle closed). The target speed is read from
//! the shared state each tick so scenarios can retune it mid-run.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::SharedState;
use groundroll_engine::clock::SimClock;

use crate::controller::{Controller, WorkerSlot};

/// Holds velocity at the shared `target_speed` with a P law.
pub struct CruiseController {
    state: Arc<SharedState>,
    clock: Arc<SimClock>,
    gain: f64,
    worker: WorkerSlot,
}

impl CruiseController {
    /// Create the controller with the configured proportional gain.
    pub fn new(state: Arc<SharedState>, clock: Arc<SimClock>, gain: f64) -> Self {
        Self {
            state,
            clock,
            gain,
            worker: WorkerSlot::new(),
        }
    }

    /// The throttle/brake split for a given speed error.
    fn law(gain: f64, error: f64) -> (f64, f64) {
        if error > 0.0 {
            ((gain * error).clamp(0.0, 1.0), 0.0)
        } else {
            (0.0, (-gain * error).clamp(0.0, 1.0))
        }
    }
}

impl Controller for CruiseController {
    fn name(&self) -> &str {
        "cruise_runway"
    }

    fn start(&self) {
        let state = Arc::clone(&self.state);
        let gain = self.gain;
        self.worker.start("cruise-runway", &self.clock, move || {
            if !state.cruise_control_enabled.load(Ordering::Acquire) {
                return;
            }
            let velocity = state.velocity.load();
            let target = state.target_speed.load();
            let (throttle, brake) = CruiseController::law(gain, target - velocity);
            state.throttle.store(throttle);
            state.brake.store(brake);
            log::debug!(
                "[cruise] v={velocity:.2} target={target:.2} throttle={throttle:.3} brake={brake:.3}"
            );
        });
        log::debug!("[cruise] started");
    }

    fn stop(&self) {
        self.worker.stop();
        log::debug!("[cruise] stopped");
    }

    fn is_enabled(&self) -> bool {
        self.state.cruise_control_enabled.load(Ordering::Acquire)
    }

    fn current_value(&self) -> f64 {
        self.state.throttle.load()
    }
}
