//! The state-manager worker: sole consumer of the state-update queue.
//!
//! Registers with the clock; each tick it drains every pending update,
//! applies it to the shared state (enforcing the committed-tick
//! invariants), runs the secondary-processing hook, and commits the
//! versioned snapshot. Writes enqueued during tick N are therefore
//! applied before the barrier lets tick N+1 start.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use groundroll_core::{SharedState, StateSnapshot, StateUpdate, StateUpdateKind};

use crate::clock::SimClock;
use crate::queue::StateUpdateQueue;

/// Owns the state-manager worker thread.
pub struct StateManager {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl StateManager {
    /// Spawn the worker. It registers with the clock and participates in
    /// the barrier until [`stop`](Self::stop) or clock shutdown.
    pub fn start(
        state: Arc<SharedState>,
        queue: StateUpdateQueue,
        clock: Arc<SimClock>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("state-manager".into())
            .spawn(move || run(state, queue, clock, flag))
            .expect("spawn state-manager thread");
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

impl Drop for StateManager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    state: Arc<SharedState>,
    queue: StateUpdateQueue,
    clock: Arc<SimClock>,
    running: Arc<AtomicBool>,
) {
    log::debug!("[state-manager] worker started");
    let registration = clock.register_worker();
    let mut step = 0;

    while running.load(Ordering::Acquire) {
        if !clock.is_running() {
            // Parked until the clock thread starts; a stop after the
            // first tick is normal termination.
            thread::sleep(std::time::Duration::from_millis(1));
            if step > 0 {
                break;
            }
            continue;
        }
        step = clock.wait_for_next_step(step);
        if !clock.is_running() {
            break;
        }

        while let Some(message) = queue.try_pop() {
            apply(&state, message);
        }

        secondary_processing(&state);
        commit_tick(&state, &clock);

        clock.notify_step_completed();
    }

    drop(registration);
    log::debug!("[state-manager] worker finished");
}

/// Apply one update, enforcing the committed-tick invariants:
/// throttle and brake saturate to `[0, 1]`, velocity clamps at 0.
pub(crate) fn apply(state: &SharedState, message: StateUpdate) {
    match message.kind {
        StateUpdateKind::Position => state.position.store(message.value),
        StateUpdateKind::Velocity => state.velocity.store(message.value.max(0.0)),
        StateUpdateKind::Acceleration => state.acceleration.store(message.value),
        StateUpdateKind::Throttle => state.throttle.store(message.value.clamp(0.0, 1.0)),
        StateUpdateKind::Brake => state.brake.store(message.value.clamp(0.0, 1.0)),
    }
}

/// Reserved extension point for derived-state processing (unit
/// conversions, filtering) between drain and commit.
fn secondary_processing(_state: &SharedState) {}

fn commit_tick(state: &SharedState, clock: &SimClock) {
    let time = clock.current_time();
    state.simulation_time.store(time);
    state.commit_snapshot(StateSnapshot {
        position: state.position.load(),
        velocity: state.velocity.load(),
        acceleration: state.acceleration.load(),
        throttle: state.throttle.load(),
        brake: state.brake.load(),
        thrust: state.thrust.load(),
        drag_force: state.drag_force.load(),
        brake_force: state.brake_force.load(),
        simulation_time: time,
        pitch_angle: state.pitch_angle.load(),
        pitch_rate: state.pitch_rate.load(),
        pitch_control_output: state.pitch_control_output.load(),
    });
    log::debug!(
        "[state-manager] t={:.2}s x={:.2}m v={:.2}m/s a={:.2}m/s² throttle={:.3} brake={:.3}",
        time,
        state.position.load(),
        state.velocity.load(),
        state.acceleration.load(),
        state.throttle.load(),
        state.brake.load(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn apply_routes_each_kind_to_its_field() {
        let state = SharedState::default();
        apply(&state, StateUpdate::new(StateUpdateKind::Position, 12.0));
        apply(&state, StateUpdate::new(StateUpdateKind::Velocity, 3.0));
        apply(&state, StateUpdate::new(StateUpdateKind::Acceleration, -1.5));
        apply(&state, StateUpdate::new(StateUpdateKind::Throttle, 0.4));
        apply(&state, StateUpdate::new(StateUpdateKind::Brake, 0.6));
        assert_eq!(state.position.load(), 12.0);
        assert_eq!(state.velocity.load(), 3.0);
        assert_eq!(state.acceleration.load(), -1.5);
        assert_eq!(state.throttle.load(), 0.4);
        assert_eq!(state.brake.load(), 0.6);
    }

    #[test]
    fn apply_saturates_controls() {
        let state = SharedState::default();
        apply(&state, StateUpdate::new(StateUpdateKind::Throttle, 1.7));
        assert_eq!(state.throttle.load(), 1.0);
        apply(&state, StateUpdate::new(StateUpdateKind::Throttle, -0.2));
        assert_eq!(state.throttle.load(), 0.0);
        apply(&state, StateUpdate::new(StateUpdateKind::Brake, 2.0));
        assert_eq!(state.brake.load(), 1.0);
    }

    #[test]
    fn apply_clamps_velocity_at_zero() {
        let state = SharedState::default();
        apply(&state, StateUpdate::new(StateUpdateKind::Velocity, -0.35));
        assert_eq!(state.velocity.load(), 0.0);
    }

    #[test]
    fn worker_drains_queue_and_commits_snapshot() {
        let state = Arc::new(SharedState::default());
        let queue = StateUpdateQueue::new();
        let clock = Arc::new(SimClock::new(0.01));

        queue.push(StateUpdate::new(StateUpdateKind::Velocity, 7.5));
        queue.push(StateUpdate::new(StateUpdateKind::Throttle, 0.3));

        let mut manager = StateManager::start(Arc::clone(&state), queue.clone(), Arc::clone(&clock));
        let clock_thread = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || clock.start())
        };

        // The manager completes each tick, so the clock keeps advancing;
        // the queued writes land on the first tick.
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while state.state_version() == 0 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let snap = state.snapshot();
        assert_eq!(snap.velocity, 7.5);
        assert_eq!(snap.throttle, 0.3);
        assert!(state.state_version() >= 1);
        assert!(snap.simulation_time > 0.0);

        clock.stop();
        manager.stop();
        clock_thread.join().unwrap();
    }
}
