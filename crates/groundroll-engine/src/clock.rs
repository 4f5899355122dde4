//! The tick-barrier simulation clock.
//!
//! [`SimClock`] is the single time authority of a scenario. It publishes
//! tick N to every registered worker, then blocks until each of them has
//! called [`notify_step_completed`](SimClock::notify_step_completed)
//! before publishing tick N+1. Workers therefore observe every tick as a
//! single event and no worker can run ahead of the barrier.
//!
//! # Barrier contract
//!
//! Every registered worker must, per tick: (1) call
//! [`wait_for_next_step`](SimClock::wait_for_next_step) with its last
//! processed step, (2) do at most one step of work, (3) call
//! `notify_step_completed` exactly once — whether or not it did useful
//! work. A missing completion deadlocks the tick; registration is
//! therefore handed out as an RAII [`WorkerRegistration`] so a panicking
//! worker still unregisters on unwind.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use groundroll_core::AtomicF64;

/// Default simulation time step in seconds.
pub const DEFAULT_TIME_STEP: f64 = 0.01;

/// Barrier-synchronized simulation clock.
///
/// One mutex guards the barrier transitions; two condvars separate the
/// "new step published" and "worker finished step" wait-sets. The
/// counters themselves are atomics so read-only accessors never contend
/// with the barrier.
pub struct SimClock {
    lock: Mutex<()>,
    step_start: Condvar,
    step_end: Condvar,
    dt: AtomicF64,
    current_time: AtomicF64,
    step_count: AtomicU64,
    running: AtomicBool,
    paused: AtomicBool,
    registered: AtomicUsize,
    completed: AtomicUsize,
}

// Compile-time assertion: SimClock must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<SimClock>();
};

/// RAII registration of one worker with the clock.
///
/// Dropping the guard unregisters the worker, including on panic, so a
/// dying worker cannot wedge the barrier.
pub struct WorkerRegistration {
    clock: Arc<SimClock>,
}

impl Drop for WorkerRegistration {
    fn drop(&mut self) {
        self.clock.unregister();
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_STEP)
    }
}

impl SimClock {
    /// Create a stopped clock with the given time step.
    pub fn new(dt: f64) -> Self {
        Self {
            lock: Mutex::new(()),
            step_start: Condvar::new(),
            step_end: Condvar::new(),
            dt: AtomicF64::new(dt),
            current_time: AtomicF64::new(0.0),
            step_count: AtomicU64::new(0),
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            registered: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Register the calling worker with the barrier.
    ///
    /// Must be paired around the worker's loop; the returned guard
    /// unregisters on drop. Registration wakes the barrier so a clock
    /// waiting for its first worker re-evaluates.
    pub fn register_worker(self: &Arc<Self>) -> WorkerRegistration {
        {
            let _guard = self.lock.lock().unwrap();
            self.registered.fetch_add(1, Ordering::AcqRel);
            self.step_end.notify_one();
        }
        log::debug!(
            "[clock] worker registered, total={}",
            self.registered.load(Ordering::Acquire)
        );
        WorkerRegistration {
            clock: Arc::clone(self),
        }
    }

    fn unregister(&self) {
        {
            let _guard = self.lock.lock().unwrap();
            self.registered.fetch_sub(1, Ordering::AcqRel);
            self.step_end.notify_one();
        }
        log::debug!(
            "[clock] worker unregistered, total={}",
            self.registered.load(Ordering::Acquire)
        );
    }

    /// Run the clock loop on the calling thread until [`stop`](Self::stop).
    ///
    /// Publishes step 1 once (the prime advance, waking workers into
    /// their first tick), then repeats: wait at the barrier for every
    /// registered worker, park while paused, advance time by `dt`, and
    /// publish the next step. With zero workers registered the barrier
    /// blocks until the first registration completes a step.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        self.paused.store(false, Ordering::Release);
        log::debug!("[clock] main loop starting");

        {
            let _guard = self.lock.lock().unwrap();
            self.advance();
            self.step_start.notify_all();
        }

        loop {
            let mut guard = self.lock.lock().unwrap();

            // Barrier: all currently registered workers must have
            // completed the published step. An empty register also
            // blocks, so tick 1 stays published until somebody joins.
            guard = self
                .step_end
                .wait_while(guard, |_| {
                    let registered = self.registered.load(Ordering::Acquire);
                    self.running.load(Ordering::Acquire)
                        && (registered == 0
                            || self.completed.load(Ordering::Acquire) < registered)
                })
                .unwrap();
            if !self.running.load(Ordering::Acquire) {
                break;
            }
            self.completed.store(0, Ordering::Release);

            // Park while paused; resume() notifies step_start.
            while self.paused.load(Ordering::Acquire) && self.running.load(Ordering::Acquire) {
                guard = self.step_start.wait(guard).unwrap();
            }
            if !self.running.load(Ordering::Acquire) {
                break;
            }

            self.advance();
            self.step_start.notify_all();
            drop(guard);
        }
        log::debug!("[clock] main loop finished");
    }

    // Caller holds the barrier lock.
    fn advance(&self) {
        let new_time = self.current_time.load() + self.dt.load();
        self.current_time.store(new_time);
        let step = self.step_count.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("[clock] advanced: time={new_time:.4} step={step}");
    }

    /// Stop the clock and release every waiter on both wait-sets.
    pub fn stop(&self) {
        {
            let _guard = self.lock.lock().unwrap();
            self.running.store(false, Ordering::Release);
        }
        self.step_start.notify_all();
        self.step_end.notify_all();
    }

    /// Pause time advancement. The in-flight tick still completes; the
    /// clock then parks before publishing the next one.
    pub fn pause(&self) {
        let _guard = self.lock.lock().unwrap();
        self.paused.store(true, Ordering::Release);
        log::debug!("[clock] paused");
    }

    /// Resume a paused clock. The next tick advances by exactly one `dt`.
    pub fn resume(&self) {
        {
            let _guard = self.lock.lock().unwrap();
            self.paused.store(false, Ordering::Release);
        }
        self.step_start.notify_all();
        log::debug!("[clock] resumed");
    }

    /// Block until the published step exceeds `last_step` or the clock
    /// stops. Returns the step count observed on wakeup.
    pub fn wait_for_next_step(&self, last_step: u64) -> u64 {
        let guard = self.lock.lock().unwrap();
        let _guard = self
            .step_start
            .wait_while(guard, |_| {
                self.running.load(Ordering::Acquire)
                    && self.step_count.load(Ordering::Acquire) <= last_step
            })
            .unwrap();
        self.step_count.load(Ordering::Acquire)
    }

    /// Report the calling worker's step as complete and poke the barrier.
    pub fn notify_step_completed(&self) {
        let _guard = self.lock.lock().unwrap();
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.step_end.notify_one();
    }

    /// Whether the clock loop is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Whether the clock is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Current simulated time in seconds.
    pub fn current_time(&self) -> f64 {
        self.current_time.load()
    }

    /// Number of published steps.
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Acquire)
    }

    /// Simulation time step in seconds.
    pub fn time_step(&self) -> f64 {
        self.dt.load()
    }

    /// Replace the time step. Takes effect from the next advance.
    pub fn set_time_step(&self, dt: f64) {
        self.dt.store(dt);
    }

    /// Number of workers currently registered with the barrier.
    pub fn registered_workers(&self) -> usize {
        self.registered.load(Ordering::Acquire)
    }
}

/// Drive a clock-synchronized worker loop on the calling thread.
///
/// Implements the barrier contract on the caller's behalf: registers,
/// then per tick waits for the next step, runs `tick` once, and reports
/// completion. A worker spawned before the clock thread parks until the
/// clock starts. The loop exits when `keep_running` clears or the clock
/// stops; the registration guard unregisters on the way out, including
/// on a panic inside `tick`.
pub fn run_synced<F>(clock: &Arc<SimClock>, keep_running: &AtomicBool, mut tick: F)
where
    F: FnMut(),
{
    let registration = clock.register_worker();
    let mut step = 0;
    while keep_running.load(Ordering::Acquire) {
        if !clock.is_running() {
            std::thread::sleep(std::time::Duration::from_millis(1));
            if step > 0 {
                // The clock ran and stopped: normal termination.
                break;
            }
            continue;
        }
        step = clock.wait_for_next_step(step);
        if !clock.is_running() {
            break;
        }
        tick();
        clock.notify_step_completed();
    }
    drop(registration);
}
