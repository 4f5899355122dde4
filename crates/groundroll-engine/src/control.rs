//! Scenario control surface: operator signals and the run watchdog.
//!
//! The control worker polls a [`ControlSignalSource`] for pause/resume
//! and terminate requests, and watches the auto-termination limits
//! (position beyond the runway overrun margin, or simulated time beyond
//! the session budget). It is deliberately not clock-registered: it must
//! keep running while the clock is paused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use groundroll_core::SharedState;

use crate::clock::SimClock;

/// Position limit that terminates the run (m).
pub const POSITION_LIMIT: f64 = 1500.0;
/// Simulated-time limit that terminates the run (s).
pub const TIME_LIMIT: f64 = 180.0;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A control request from the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlSignal {
    /// Toggle between paused and running.
    TogglePause,
    /// End the run.
    Terminate,
}

/// Source of operator control signals.
///
/// The scenario runner depends only on this trait; console or keypress
/// front-ends implement it, and headless runs use [`NullSignalSource`].
pub trait ControlSignalSource: Send {
    /// Poll for the next pending signal, without blocking.
    fn poll(&mut self) -> Option<ControlSignal>;
}

/// A signal source that never emits anything (headless runs).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSignalSource;

impl ControlSignalSource for NullSignalSource {
    fn poll(&mut self) -> Option<ControlSignal> {
        None
    }
}

/// Owns the control worker thread.
pub struct SimulationControl {
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SimulationControl {
    /// Spawn the control worker over the given signal source.
    pub fn start(
        state: Arc<SharedState>,
        clock: Arc<SimClock>,
        signals: Box<dyn ControlSignalSource>,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let worker = thread::Builder::new()
            .name("sim-control".into())
            .spawn(move || run(state, clock, signals, flag))
            .expect("spawn sim-control thread");
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

impl Drop for SimulationControl {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    state: Arc<SharedState>,
    clock: Arc<SimClock>,
    mut signals: Box<dyn ControlSignalSource>,
    running: Arc<AtomicBool>,
) {
    log::debug!("[control] worker started");
    while running.load(Ordering::Acquire) {
        match signals.poll() {
            Some(ControlSignal::TogglePause) => {
                if clock.is_paused() {
                    clock.resume();
                    log::info!("[control] simulation resumed");
                } else {
                    clock.pause();
                    log::info!("[control] simulation paused");
                }
            }
            Some(ControlSignal::Terminate) => {
                log::info!("[control] terminate requested");
                terminate(&state, &clock);
                break;
            }
            None => {}
        }

        let position = state.position.load();
        let time = state.simulation_time.load();
        if position > POSITION_LIMIT || time > TIME_LIMIT {
            if position > POSITION_LIMIT {
                log::info!("[control] auto-stop: position {position:.2} m exceeds {POSITION_LIMIT} m");
            }
            if time > TIME_LIMIT {
                log::info!("[control] auto-stop: time {time:.2} s exceeds {TIME_LIMIT} s");
            }
            terminate(&state, &clock);
            break;
        }

        thread::sleep(POLL_INTERVAL);
    }
    log::debug!("[control] worker finished");
}

fn terminate(state: &SharedState, clock: &SimClock) {
    state.simulation_running.store(false, Ordering::Release);
    state.notify_shutdown();
    clock.stop();
}
