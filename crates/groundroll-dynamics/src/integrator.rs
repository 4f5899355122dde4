//! The dynamics integrator worker.
//!
//! A clock-synchronized worker that, each tick, evaluates the force
//! model, commits the force breakdown to the shared state, integrates
//! acceleration into velocity and position, and enqueues the kinematic
//! updates for the state manager to apply. Position integrates with the
//! pre-step velocity (semi-implicit Euler).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use groundroll_core::{SharedState, StateUpdate, StateUpdateKind};
use groundroll_engine::clock::{run_synced, SimClock};
use groundroll_engine::queue::StateUpdateQueue;

use crate::aircraft::AircraftConfig;
use crate::forces::ForceModel;

/// Integration scheme driven by the worker each tick.
pub trait DynamicsModel: Send + Sync {
    /// Advance the vehicle one step of `dt` seconds.
    fn step(
        &self,
        state: &SharedState,
        queue: &StateUpdateQueue,
        aircraft: &Arc<dyn AircraftConfig>,
        forces: &Arc<dyn ForceModel>,
        dt: f64,
    );
}

fn commit_forces(state: &SharedState, forces: &crate::forces::ForceBreakdown) {
    state.thrust.store(forces.thrust);
    state.drag_force.store(forces.drag);
    state.brake_force.store(forces.brake_force);
}

/// Plain semi-implicit Euler over the force model.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearDynamics;

impl DynamicsModel for LinearDynamics {
    fn step(
        &self,
        state: &SharedState,
        queue: &StateUpdateQueue,
        aircraft: &Arc<dyn AircraftConfig>,
        forces: &Arc<dyn ForceModel>,
        dt: f64,
    ) {
        let velocity = state.velocity.load();
        let position = state.position.load();

        let breakdown = forces.net_force(state, velocity, aircraft);
        commit_forces(state, &breakdown);

        let acceleration = breakdown.net_force / aircraft.mass();
        let new_velocity = velocity + acceleration * dt;
        let new_position = position + velocity * dt;

        queue.push(StateUpdate::new(StateUpdateKind::Velocity, new_velocity));
        queue.push(StateUpdate::new(StateUpdateKind::Position, new_position));
        queue.push(StateUpdate::new(StateUpdateKind::Acceleration, acceleration));
    }
}

/// Euler variant with deterministic nonlinear correction terms layered
/// onto the acceleration and velocity updates.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonlinearDynamics;

impl DynamicsModel for NonlinearDynamics {
    fn step(
        &self,
        state: &SharedState,
        queue: &StateUpdateQueue,
        aircraft: &Arc<dyn AircraftConfig>,
        forces: &Arc<dyn ForceModel>,
        dt: f64,
    ) {
        let velocity = state.velocity.load();
        let position = state.position.load();

        let breakdown = forces.net_force(state, velocity, aircraft);
        commit_forces(state, &breakdown);

        let acceleration = breakdown.net_force / aircraft.mass() + 0.5 * (velocity / 10.0).sin();
        let new_velocity = velocity + acceleration * dt + 0.1 * (velocity / 8.0).cos();
        let new_position = position + velocity * dt + 0.5 * acceleration * dt * dt;

        queue.push(StateUpdate::new(StateUpdateKind::Velocity, new_velocity));
        queue.push(StateUpdate::new(StateUpdateKind::Position, new_position));
        queue.push(StateUpdate::new(StateUpdateKind::Acceleration, acceleration));
    }
}

/// Owns the integrator worker thread.
pub struct DynamicsWorker {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl DynamicsWorker {
    /// Spawn the integrator over the selected dynamics and force models.
    pub fn start(
        state: Arc<SharedState>,
        queue: StateUpdateQueue,
        clock: Arc<SimClock>,
        aircraft: Arc<dyn AircraftConfig>,
        forces: Arc<dyn ForceModel>,
        dynamics: Arc<dyn DynamicsModel>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("dynamics".into())
            .spawn(move || {
                log::debug!("[dynamics] worker started");
                let tick_clock = Arc::clone(&clock);
                run_synced(&clock, &flag, move || {
                    let dt = tick_clock.time_step();
                    dynamics.step(&state, &queue, &aircraft, &forces, dt);
                    state.simulation_time.store(tick_clock.current_time());
                });
                log::debug!("[dynamics] worker finished");
            })
            .expect("spawn dynamics thread");
        Self {
            running,
            worker: Some(worker),
        }
    }

    /// Signal the worker to exit and join it.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for DynamicsWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
