//! The shared vehicle state cell.
//!
//! [`SharedState`] is created once per scenario and shared (via `Arc`)
//! with every worker thread. Scalars are individually atomic; the
//! versioned [`StateSnapshot`] is the only mutex-guarded aggregate.
//!
//! Flight mode and the four control-authority bits are packed into a
//! single atomic byte so a mode switch updates the whole group in one
//! store — a reader can never observe a half-applied authority handover.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crate::atomic::AtomicF64;
use crate::error::InitError;

// Authority bits (low nibble of the packed mode byte).
const PILOT_THROTTLE: u8 = 0b0000_0001;
const PILOT_BRAKE: u8 = 0b0000_0010;
const AUTO_THROTTLE: u8 = 0b0000_0100;
const AUTO_BRAKE: u8 = 0b0000_1000;

// Mode tag (bits 4-5 of the packed mode byte).
const MODE_SHIFT: u8 = 4;
const MODE_MASK: u8 = 0b0011_0000;

/// Which party controls the vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlightMode {
    /// Pilot has full control; auto controllers are locked out.
    Manual,
    /// The auto system has full control.
    Auto,
    /// Pilot and auto system share control of both channels.
    SemiAuto,
}

impl FlightMode {
    /// Authority bits implied by this mode.
    fn authority_bits(self) -> u8 {
        match self {
            Self::Manual => PILOT_THROTTLE | PILOT_BRAKE,
            Self::Auto => AUTO_THROTTLE | AUTO_BRAKE,
            Self::SemiAuto => PILOT_THROTTLE | PILOT_BRAKE | AUTO_THROTTLE | AUTO_BRAKE,
        }
    }

    fn tag(self) -> u8 {
        match self {
            Self::Manual => 0,
            Self::Auto => 1,
            Self::SemiAuto => 2,
        }
    }

    fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::Auto,
            2 => Self::SemiAuto,
            _ => Self::Manual,
        }
    }

    /// Packed byte (mode tag + authority bits) for this mode.
    fn packed(self) -> u8 {
        (self.tag() << MODE_SHIFT) | self.authority_bits()
    }

    /// Parse a config-file mode name (`AUTO`, `MANUAL`, `SEMI_AUTO`).
    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "MANUAL" => Some(Self::Manual),
            "AUTO" => Some(Self::Auto),
            "SEMI_AUTO" => Some(Self::SemiAuto),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "MANUAL"),
            Self::Auto => write!(f, "AUTO"),
            Self::SemiAuto => write!(f, "SEMI_AUTO"),
        }
    }
}

/// Coherent copy of the declared snapshot subset: kinematics, controls,
/// forces, simulation time, and attitude. Enable flags and mode are
/// intentionally outside the snapshot set.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StateSnapshot {
    /// Longitudinal position along the runway (m).
    pub position: f64,
    /// Longitudinal velocity (m/s).
    pub velocity: f64,
    /// Longitudinal acceleration (m/s²).
    pub acceleration: f64,
    /// Throttle setting in `[0, 1]`.
    pub throttle: f64,
    /// Brake setting in `[0, 1]`.
    pub brake: f64,
    /// Engine thrust (N).
    pub thrust: f64,
    /// Aerodynamic drag (N).
    pub drag_force: f64,
    /// Wheel brake force (N).
    pub brake_force: f64,
    /// Simulated time at the instant of the snapshot (s).
    pub simulation_time: f64,
    /// Pitch angle (rad).
    pub pitch_angle: f64,
    /// Pitch rate (rad/s).
    pub pitch_rate: f64,
    /// Pitch controller output in `[-1, 1]`.
    pub pitch_control_output: f64,
}

/// Process-wide record of the vehicle and simulation status.
///
/// All scalar fields are read and written concurrently by worker threads;
/// individual reads and writes are atomic with acquire/release ordering.
/// Construction goes through [`SharedState::create`], which runs the
/// scenario's initialization hook and reports its failure to the caller.
pub struct SharedState {
    // ── Kinematics ────────────────────────────────────────────────
    /// Longitudinal position (m).
    pub position: AtomicF64,
    /// Longitudinal velocity (m/s). Clamped at 0 by the state manager.
    pub velocity: AtomicF64,
    /// Longitudinal acceleration (m/s²).
    pub acceleration: AtomicF64,

    // ── Controls ──────────────────────────────────────────────────
    /// Throttle setting, saturated to `[0, 1]` on commit.
    pub throttle: AtomicF64,
    /// Brake setting, saturated to `[0, 1]` on commit.
    pub brake: AtomicF64,

    // ── Forces ────────────────────────────────────────────────────
    /// Engine thrust (N).
    pub thrust: AtomicF64,
    /// Aerodynamic drag (N).
    pub drag_force: AtomicF64,
    /// Wheel brake force (N).
    pub brake_force: AtomicF64,

    // ── Attitude ──────────────────────────────────────────────────
    /// Pitch angle (rad).
    pub pitch_angle: AtomicF64,
    /// Pitch rate (rad/s).
    pub pitch_rate: AtomicF64,
    /// Pitch controller output in `[-1, 1]`.
    pub pitch_control_output: AtomicF64,

    // ── Clock mirror ──────────────────────────────────────────────
    /// Simulated time mirrored from the clock each tick (s).
    pub simulation_time: AtomicF64,

    // ── Lifecycle flags ───────────────────────────────────────────
    /// The scenario is running; going false ends the run.
    pub simulation_running: AtomicBool,
    /// The scenario has started ticking.
    pub simulation_started: AtomicBool,
    /// The operator confirmed the run.
    pub user_confirmed: AtomicBool,
    /// Basic initialization finished.
    pub system_ready: AtomicBool,
    /// The final-stop event has fired.
    pub final_stop_enabled: AtomicBool,
    /// The abort-takeoff event has latched.
    pub abort_triggered: AtomicBool,

    // ── Controller enables ────────────────────────────────────────
    /// Throttle controllers may act this tick.
    pub throttle_control_enabled: AtomicBool,
    /// Brake controller may act this tick.
    pub brake_control_enabled: AtomicBool,
    /// Cruise controller may act this tick.
    pub cruise_control_enabled: AtomicBool,
    /// Pitch controller may act this tick.
    pub pitch_control_enabled: AtomicBool,

    // ── Targets ───────────────────────────────────────────────────
    /// Cruise target speed (m/s).
    pub target_speed: AtomicF64,
    /// Abort-takeoff decision speed (m/s).
    pub abort_speed: AtomicF64,
    /// Margin below the abort speed used by scenario predicates (m/s).
    pub abort_speed_threshold: AtomicF64,

    // Mode tag + authority bits, updated as a group in one store.
    mode_bits: AtomicU8,

    // Versioned snapshot: {lock, copy, bump, unlock} on commit.
    snapshot: Mutex<StateSnapshot>,
    state_version: AtomicU64,

    // Start/stop rendezvous for the scenario runner.
    lifecycle_lock: Mutex<()>,
    lifecycle_cv: Condvar,
    confirm_lock: Mutex<()>,
    confirm_cv: Condvar,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            position: AtomicF64::default(),
            velocity: AtomicF64::default(),
            acceleration: AtomicF64::default(),
            throttle: AtomicF64::default(),
            brake: AtomicF64::default(),
            thrust: AtomicF64::default(),
            drag_force: AtomicF64::default(),
            brake_force: AtomicF64::default(),
            pitch_angle: AtomicF64::default(),
            pitch_rate: AtomicF64::default(),
            pitch_control_output: AtomicF64::default(),
            simulation_time: AtomicF64::default(),
            simulation_running: AtomicBool::new(false),
            simulation_started: AtomicBool::new(false),
            user_confirmed: AtomicBool::new(false),
            system_ready: AtomicBool::new(false),
            final_stop_enabled: AtomicBool::new(false),
            abort_triggered: AtomicBool::new(false),
            throttle_control_enabled: AtomicBool::new(false),
            brake_control_enabled: AtomicBool::new(false),
            cruise_control_enabled: AtomicBool::new(false),
            pitch_control_enabled: AtomicBool::new(false),
            target_speed: AtomicF64::default(),
            abort_speed: AtomicF64::default(),
            abort_speed_threshold: AtomicF64::default(),
            mode_bits: AtomicU8::new(FlightMode::Manual.packed()),
            snapshot: Mutex::new(StateSnapshot::default()),
            state_version: AtomicU64::new(0),
            lifecycle_lock: Mutex::new(()),
            lifecycle_cv: Condvar::new(),
            confirm_lock: Mutex::new(()),
            confirm_cv: Condvar::new(),
        }
    }
}

// Compile-time assertion: SharedState must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SharedState>();
};

impl SharedState {
    /// Create the shared state, run basic initialization, then the
    /// scenario's hook.
    ///
    /// `system_ready` is set before the hook runs so the hook can
    /// observe a fully initialized cell. A hook failure is surfaced to
    /// the caller; the scenario must abort before any worker starts.
    pub fn create<F>(init: F) -> Result<Arc<Self>, InitError>
    where
        F: FnOnce(&Self) -> Result<(), InitError>,
    {
        let state = Arc::new(Self::default());
        state.system_ready.store(true, Ordering::Release);
        init(&state)?;
        log::debug!("[state] shared state initialized");
        Ok(state)
    }

    // ── Snapshot & versioning ─────────────────────────────────────

    /// Replace the snapshot and bump the version by exactly one.
    pub fn commit_snapshot(&self, new_values: StateSnapshot) {
        let mut guard = self.snapshot.lock().unwrap();
        *guard = new_values;
        self.state_version.fetch_add(1, Ordering::Release);
    }

    /// Coherent copy of the snapshot subset.
    pub fn snapshot(&self) -> StateSnapshot {
        *self.snapshot.lock().unwrap()
    }

    /// Monotonically increasing snapshot version.
    pub fn state_version(&self) -> u64 {
        self.state_version.load(Ordering::Acquire)
    }

    // ── Flight mode & authority ───────────────────────────────────

    /// Switch flight mode, updating the four authority bits as a group.
    pub fn set_flight_mode(&self, mode: FlightMode) {
        let old = FlightMode::from_tag(self.mode_bits.swap(mode.packed(), Ordering::AcqRel) >> MODE_SHIFT);
        if old != mode {
            log::debug!("[state] flight mode {old} -> {mode}");
        }
    }

    /// Current flight mode.
    pub fn flight_mode(&self) -> FlightMode {
        FlightMode::from_tag((self.mode_bits.load(Ordering::Acquire) & MODE_MASK) >> MODE_SHIFT)
    }

    /// Whether the pilot owns the throttle channel.
    pub fn pilot_has_throttle_control(&self) -> bool {
        self.mode_bits.load(Ordering::Acquire) & PILOT_THROTTLE != 0
    }

    /// Whether the pilot owns the brake channel.
    pub fn pilot_has_brake_control(&self) -> bool {
        self.mode_bits.load(Ordering::Acquire) & PILOT_BRAKE != 0
    }

    /// Whether the auto system owns the throttle channel.
    pub fn auto_has_throttle_control(&self) -> bool {
        self.mode_bits.load(Ordering::Acquire) & AUTO_THROTTLE != 0
    }

    /// Whether the auto system owns the brake channel.
    pub fn auto_has_brake_control(&self) -> bool {
        self.mode_bits.load(Ordering::Acquire) & AUTO_BRAKE != 0
    }

    /// Pilot and auto system both own some channel (SemiAuto sharing).
    pub fn has_control_conflict(&self) -> bool {
        let bits = self.mode_bits.load(Ordering::Acquire);
        (bits & PILOT_THROTTLE != 0 && bits & AUTO_THROTTLE != 0)
            || (bits & PILOT_BRAKE != 0 && bits & AUTO_BRAKE != 0)
    }

    // ── Start/stop rendezvous ─────────────────────────────────────

    /// Block until the scenario starts (or stops before starting).
    pub fn wait_for_start(&self) {
        let guard = self.lifecycle_lock.lock().unwrap();
        let _guard = self
            .lifecycle_cv
            .wait_while(guard, |_| {
                !self.simulation_started.load(Ordering::Acquire)
                    && self.simulation_running.load(Ordering::Acquire)
            })
            .unwrap();
    }

    /// Mark the scenario as started and wake waiters.
    pub fn notify_start(&self) {
        {
            let _guard = self.lifecycle_lock.lock().unwrap();
            self.simulation_started.store(true, Ordering::Release);
        }
        self.lifecycle_cv.notify_all();
    }

    /// Block until the final-stop event fires (or the run ends).
    pub fn wait_for_final_stop(&self) {
        let guard = self.lifecycle_lock.lock().unwrap();
        let _guard = self
            .lifecycle_cv
            .wait_while(guard, |_| {
                !self.final_stop_enabled.load(Ordering::Acquire)
                    && self.simulation_running.load(Ordering::Acquire)
            })
            .unwrap();
    }

    /// Latch the final-stop flag and wake waiters.
    pub fn notify_final_stop(&self) {
        {
            let _guard = self.lifecycle_lock.lock().unwrap();
            self.final_stop_enabled.store(true, Ordering::Release);
        }
        self.lifecycle_cv.notify_all();
    }

    /// Wake anything parked in [`wait_for_start`](Self::wait_for_start) or
    /// [`wait_for_final_stop`](Self::wait_for_final_stop) after flipping
    /// `simulation_running` off.
    pub fn notify_shutdown(&self) {
        let _guard = self.lifecycle_lock.lock().unwrap();
        self.lifecycle_cv.notify_all();
    }

    /// Block until the operator confirms the run.
    pub fn wait_for_user_confirmation(&self) {
        let guard = self.confirm_lock.lock().unwrap();
        let _guard = self
            .confirm_cv
            .wait_while(guard, |_| !self.user_confirmed.load(Ordering::Acquire))
            .unwrap();
    }

    /// Record the operator's confirmation and wake waiters.
    pub fn confirm(&self) {
        {
            let _guard = self.confirm_lock.lock().unwrap();
            self.user_confirmed.store(true, Ordering::Release);
        }
        self.confirm_cv.notify_all();
    }
}
