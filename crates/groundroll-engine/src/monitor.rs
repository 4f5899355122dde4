//! Clock-synchronized event monitor.
//!
//! Each tick, every event definition whose latch is still clear has its
//! predicate evaluated against the shared state; on the first true the
//! definition is latched and its name is published to the bus with an
//! empty payload. Latching here makes the trigger edge-sensitive — a
//! predicate that stays true (or flickers) publishes exactly once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use groundroll_core::{EventPayload, EventTable, SharedState};

use crate::bus::EventBus;
use crate::clock::SimClock;

/// Owns the event-monitor worker thread.
pub struct EventMonitor {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl EventMonitor {
    /// Spawn the monitor over `definitions`.
    pub fn start(
        state: Arc<SharedState>,
        bus: Arc<EventBus>,
        definitions: Arc<EventTable>,
        clock: Arc<SimClock>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("event-monitor".into())
            .spawn(move || run(state, bus, definitions, clock, flag))
            .expect("spawn event-monitor thread");
        log::debug!("[monitor] started");
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
        log::debug!("[monitor] stopped");
    }
}

impl Drop for EventMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    state: Arc<SharedState>,
    bus: Arc<EventBus>,
    definitions: Arc<EventTable>,
    clock: Arc<SimClock>,
    running: Arc<AtomicBool>,
) {
    let registration = clock.register_worker();
    let mut latched: HashSet<String> = HashSet::new();
    let mut step = 0;
    let mut last_running = state.simulation_running.load(Ordering::Acquire);
    let mut last_started = state.simulation_started.load(Ordering::Acquire);

    while running.load(Ordering::Acquire) {
        if clock.is_running() {
            step = clock.wait_for_next_step(step);
            if !clock.is_running() {
                break;
            }
        } else {
            thread::sleep(Duration::from_millis(5));
            continue;
        }

        let now_running = state.simulation_running.load(Ordering::Acquire);
        if now_running != last_running {
            log::debug!("[monitor] simulation_running: {last_running} -> {now_running}");
            last_running = now_running;
        }
        let now_started = state.simulation_started.load(Ordering::Acquire);
        if now_started != last_started {
            log::debug!("[monitor] simulation_started: {last_started} -> {now_started}");
            last_started = now_started;
        }

        for (name, definition) in definitions.iter() {
            if latched.contains(name) {
                continue;
            }
            if (definition.predicate)(&state) {
                latched.insert(name.clone());
                bus.publish(name, EventPayload::Empty);
                log::debug!(
                    "[monitor] event {name} fired at t={:.2}s",
                    clock.current_time()
                );
            }
        }

        clock.notify_step_completed();
    }

    drop(registration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundroll_core::event::{table_from, EventDefinition};
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

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
    fn predicate_fires_once_despite_staying_true() {
        let state = Arc::new(SharedState::default());
        let bus = Arc::new(EventBus::new());
        let clock = Arc::new(SimClock::new(0.01));

        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            bus.subscribe("SPEED_REACHED", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        let table = Arc::new(table_from([EventDefinition::new(
            "SPEED_REACHED",
            "velocity at or above threshold",
            |s: &SharedState| s.velocity.load() >= 10.0,
            [],
        )]));

        state.velocity.store(25.0);

        let mut monitor = EventMonitor::start(
            Arc::clone(&state),
            Arc::clone(&bus),
            table,
            Arc::clone(&clock),
        );
        let clock_thread = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || clock.start())
        };

        // Predicate is true on every tick; the latch makes it publish once.
        assert!(wait_until(2000, || hits.load(Ordering::SeqCst) >= 1));
        assert!(wait_until(200, || clock.step_count() > 20));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Dropping velocity below the threshold and raising it again
        // must not re-fire.
        state.velocity.store(0.0);
        thread::sleep(Duration::from_millis(20));
        state.velocity.store(25.0);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        clock.stop();
        monitor.stop();
        clock_thread.join().unwrap();
        bus.shutdown();
    }

    #[test]
    fn false_predicate_never_fires() {
        let state = Arc::new(SharedState::default());
        let bus = Arc::new(EventBus::new());
        let clock = Arc::new(SimClock::new(0.01));

        let table = Arc::new(table_from([EventDefinition::new(
            "NEVER",
            "",
            |_: &SharedState| false,
            [],
        )]));

        let mut monitor = EventMonitor::start(
            Arc::clone(&state),
            Arc::clone(&bus),
            table,
            Arc::clone(&clock),
        );
        let clock_thread = {
            let clock = Arc::clone(&clock);
            thread::spawn(move || clock.start())
        };

        assert!(wait_until(2000, || clock.step_count() > 10));
        assert!(!bus.is_event_triggered("NEVER"));

        clock.stop();
        monitor.stop();
        clock_thread.join().unwrap();
        bus.shutdown();
    }
}
