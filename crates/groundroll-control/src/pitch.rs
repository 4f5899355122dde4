//! Pitch-hold PID controller.
//!
//! Holds the vehicle at a target pitch angle. The integral term is
//! clamped to keep a long-standing error from winding up, and the final
//! output saturates to the actuator range `[-1, 1]` before being stored
//! to `pitch_control_output`. Gains and target are atomic so they can be
//! retuned while the worker runs.

use std::f64::consts::PI;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::{AtomicF64, SharedState};
use groundroll_engine::clock::SimClock;

use crate::controller::{Controller, WorkerSlot};

/// Anti-windup bound on the accumulated integral term.
const INTEGRAL_LIMIT: f64 = 10.0;
/// Actuator output range.
const OUTPUT_LIMIT: f64 = 1.0;

/// Mutable PID state shared between the handle and its worker.
struct PitchShared {
    kp: AtomicF64,
    ki: AtomicF64,
    kd: AtomicF64,
    target: AtomicF64,
    integral: AtomicF64,
    prev_error: AtomicF64,
}

/// PID controller holding `pitch_angle` at a target.
pub struct PitchHoldController {
    state: Arc<SharedState>,
    clock: Arc<SimClock>,
    pid: Arc<PitchShared>,
    worker: WorkerSlot,
}

impl PitchHoldController {
    /// Create the controller with default gains (kp=1.0, ki=0.1, kd=0.05).
    pub fn new(state: Arc<SharedState>, clock: Arc<SimClock>) -> Self {
        Self {
            state,
            clock,
            pid: Arc::new(PitchShared {
                kp: AtomicF64::new(1.0),
                ki: AtomicF64::new(0.1),
                kd: AtomicF64::new(0.05),
                target: AtomicF64::new(0.0),
                integral: AtomicF64::new(0.0),
                prev_error: AtomicF64::new(0.0),
            }),
            worker: WorkerSlot::new(),
        }
    }

    /// Replace the PID gains.
    pub fn set_pid(&self, kp: f64, ki: f64, kd: f64) {
        self.pid.kp.store(kp);
        self.pid.ki.store(ki);
        self.pid.kd.store(kd);
        log::debug!("[pitch-hold] gains kp={kp} ki={ki} kd={kd}");
    }

    /// Set the target pitch angle (rad).
    pub fn set_target_pitch(&self, target: f64) {
        self.pid.target.store(target);
        log::debug!("[pitch-hold] target {:.2}°", target.to_degrees());
    }

    /// Current target pitch angle (rad).
    pub fn target_pitch(&self) -> f64 {
        self.pid.target.load()
    }

    /// Zero the accumulated integral term.
    pub fn reset_integral(&self) {
        self.pid.integral.store(0.0);
    }

    /// One PID evaluation. Returns the saturated output.
    fn evaluate(pid: &PitchShared, current_pitch: f64, dt: f64) -> f64 {
        let error = (pid.target.load() - current_pitch).clamp(-PI, PI);

        let proportional = pid.kp.load() * error;

        let integral = (pid.integral.load() + pid.ki.load() * error * dt)
            .clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        pid.integral.store(integral);

        let derivative = pid.kd.load() * (error - pid.prev_error.load()) / dt;
        pid.prev_error.store(error);

        (proportional + integral + derivative).clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT)
    }
}

impl Controller for PitchHoldController {
    fn name(&self) -> &str {
        "pitch_hold"
    }

    fn start(&self) {
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let pid = Arc::clone(&self.pid);
        self.worker.start("pitch-hold", &self.clock, move || {
            if !state.pitch_control_enabled.load(Ordering::Acquire) {
                return;
            }
            let output = PitchHoldController::evaluate(&pid, state.pitch_angle.load(), clock.time_step());
            state.pitch_control_output.store(output);
            log::debug!(
                "[pitch-hold] pitch={:.2}° target={:.2}° output={output:.3}",
                state.pitch_angle.load().to_degrees(),
                pid.target.load().to_degrees(),
            );
        });
        log::debug!("[pitch-hold] started");
    }

    fn stop(&self) {
        self.worker.stop();
        log::debug!("[pitch-hold] stopped");
    }

    fn is_enabled(&self) -> bool {
        self.state.pitch_control_enabled.load(Ordering::Acquire)
    }

    fn current_value(&self) -> f64 {
        self.state.pitch_control_output.load()
    }
}
