//! Throttle ramp controllers.
//!
//! Two independent workers share the `throttle_control_enabled` flag:
//! [`ThrottleIncrease`] ramps the throttle up at a configured rate and
//! [`ThrottleDecrease`] ramps it down. Both enqueue their writes on the
//! state-update queue — the state manager owns the committed value.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::{SharedState, StateUpdate, StateUpdateKind};
use groundroll_engine::clock::SimClock;
use groundroll_engine::queue::StateUpdateQueue;

use crate::controller::{Controller, WorkerSlot};

/// Ignore throttle deltas below this when deciding whether to enqueue.
const CHANGE_EPSILON: f64 = 1e-6;

/// Ramps the throttle towards 1 at `rate` per second.
pub struct ThrottleIncrease {
    state: Arc<SharedState>,
    clock: Arc<SimClock>,
    queue: StateUpdateQueue,
    rate: f64,
    worker: WorkerSlot,
}

impl ThrottleIncrease {
    /// Create the controller with the configured ramp rate (1/s).
    pub fn new(
        state: Arc<SharedState>,
        clock: Arc<SimClock>,
        queue: StateUpdateQueue,
        rate: f64,
    ) -> Self {
        Self {
            state,
            clock,
            queue,
            rate,
            worker: WorkerSlot::new(),
        }
    }
}

impl Controller for ThrottleIncrease {
    fn name(&self) -> &str {
        "throttle_inc"
    }

    fn start(&self) {
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let queue = self.queue.clone();
        let rate = self.rate;
        self.worker.start("throttle-inc", &self.clock, move || {
            if !state.throttle_control_enabled.load(Ordering::Acquire) {
                return;
            }
            let current = state.throttle.load();
            let next = (current + rate * clock.time_step()).clamp(0.0, 1.0);
            if (next - current).abs() > CHANGE_EPSILON {
                queue.push(StateUpdate::new(StateUpdateKind::Throttle, next));
                log::debug!("[throttle-inc] requested throttle {next:.3}");
            }
        });
        log::debug!("[throttle-inc] started");
    }

    fn stop(&self) {
        self.worker.stop();
        log::debug!("[throttle-inc] stopped");
    }

    fn is_enabled(&self) -> bool {
        self.state.throttle_control_enabled.load(Ordering::Acquire)
    }

    fn current_value(&self) -> f64 {
        self.state.throttle.load()
    }
}

/// Ramps the throttle towards 0 at `rate` per second.
pub struct ThrottleDecrease {
    state: Arc<SharedState>,
    clock: Arc<SimClock>,
    queue: StateUpdateQueue,
    rate: f64,
    worker: WorkerSlot,
}

impl ThrottleDecrease {
    /// Create the controller with the configured ramp rate (1/s).
    pub fn new(
        state: Arc<SharedState>,
        clock: Arc<SimClock>,
        queue: StateUpdateQueue,
        rate: f64,
    ) -> Self {
        Self {
            state,
            clock,
            queue,
            rate,
            worker: WorkerSlot::new(),
        }
    }
}

impl Controller for ThrottleDecrease {
    fn name(&self) -> &str {
        "throttle_dec"
    }

    fn start(&self) {
        let state = Arc::clone(&self.state);
        let clock = Arc::clone(&self.clock);
        let queue = self.queue.clone();
        let rate = self.rate;
        self.worker.start("throttle-dec", &self.clock, move || {
            if !state.throttle_control_enabled.load(Ordering::Acquire) {
                return;
            }
            let current = state.throttle.load();
            let next = (current - rate * clock.time_step()).max(0.0);
            queue.push(StateUpdate::new(StateUpdateKind::Throttle, next));
            log::debug!("[throttle-dec] throttle {:.1}%", next * 100.0);
        });
        log::debug!("[throttle-dec] started");
    }

    fn stop(&self) {
        self.worker.stop();
        log::debug!("[throttle-dec] stopped");
    }

    fn is_enabled(&self) -> bool {
        self.state.throttle_control_enabled.load(Ordering::Acquire)
    }

    fn current_value(&self) -> f64 {
        self.state.throttle.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn fixture() -> (Arc<SharedState>, Arc<SimClock>, StateUpdateQueue) {
        (
            Arc::new(SharedState::default()),
            Arc::new(SimClock::new(0.01)),
            StateUpdateQueue::new(),
        )
    }

    fn start_clock(clock: &Arc<SimClock>) -> thread::JoinHandle<()> {
        let clock = Arc::clone(clock);
        thread::spawn(move || clock.start())
    }

    fn wait_until(deadline_ms: u64, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn increase_enqueues_saturated_steps() {
        let (state, clock, queue) = fixture();
        state.throttle_control_enabled.store(true, Ordering::Release);
        let controller =
            ThrottleIncrease::new(Arc::clone(&state), Arc::clone(&clock), queue.clone(), 0.1);

        let clock_handle = start_clock(&clock);
        controller.start();
        assert!(wait_until(2000, || !queue.is_empty()));
        controller.stop();
        clock.stop();
        clock_handle.join().unwrap();

        let update = queue.try_pop().unwrap();
        assert_eq!(update.kind, StateUpdateKind::Throttle);
        // One step from zero at 0.1/s with dt = 0.01.
        assert!((update.value - 0.001).abs() < 1e-9);
    }

    #[test]
    fn increase_is_gated_by_enable_flag() {
        let (state, clock, queue) = fixture();
        let controller =
            ThrottleIncrease::new(Arc::clone(&state), Arc::clone(&clock), queue.clone(), 0.1);

        let clock_handle = start_clock(&clock);
        controller.start();
        // Flag never set: the worker ticks but produces nothing.
        assert!(wait_until(500, || clock.step_count() > 10));
        assert!(queue.is_empty());
        controller.stop();
        clock.stop();
        clock_handle.join().unwrap();
    }

    #[test]
    fn increase_stops_enqueueing_at_full_throttle() {
        let (state, clock, queue) = fixture();
        state.throttle_control_enabled.store(true, Ordering::Release);
        state.throttle.store(1.0);
        let controller =
            ThrottleIncrease::new(Arc::clone(&state), Arc::clone(&clock), queue.clone(), 0.1);

        let clock_handle = start_clock(&clock);
        controller.start();
        assert!(wait_until(500, || clock.step_count() > 10));
        // Saturated: next == current, so nothing is pushed.
        assert!(queue.is_empty());
        controller.stop();
        clock.stop();
        clock_handle.join().unwrap();
    }

    #[test]
    fn decrease_floors_at_zero() {
        let (state, clock, queue) = fixture();
        state.throttle_control_enabled.store(true, Ordering::Release);
        state.throttle.store(0.001);
        let controller =
            ThrottleDecrease::new(Arc::clone(&state), Arc::clone(&clock), queue.clone(), 0.2);

        let clock_handle = start_clock(&clock);
        controller.start();
        assert!(wait_until(2000, || !queue.is_empty()));
        controller.stop();
        clock.stop();
        clock_handle.join().unwrap();

        let update = queue.try_pop().unwrap();
        assert_eq!(update.kind, StateUpdateKind::Throttle);
        assert!(update.value >= 0.0);
    }

    #[test]
    fn names_match_the_roster() {
        let (state, clock, queue) = fixture();
        let inc = ThrottleIncrease::new(Arc::clone(&state), Arc::clone(&clock), queue.clone(), 0.1);
        let dec = ThrottleDecrease::new(state, clock, queue, 0.2);
        assert_eq!(inc.name(), "throttle_inc");
        assert_eq!(dec.name(), "throttle_dec");
    }
}
