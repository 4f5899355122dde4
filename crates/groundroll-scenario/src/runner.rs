//! The scenario runner: wires a scenario into the full kernel and
//! drives it to completion.
//!
//! Construction order follows the dependency chain (state → queue → bus
//! → manager → workers → clock); shutdown releases the barrier first
//! (`clock.stop()`) so every clock-synchronized worker unblocks, then
//! joins workers in reverse start order.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use groundroll_control::{ControllerManager, ControllerRates};
use groundroll_core::{EventTable, InitError, SharedState, StateSnapshot};
use groundroll_dynamics::{
    Ac1, AircraftConfig, DynamicsModel, DynamicsWorker, ForceModel, LinearDynamics,
    LinearForceModel,
};
use groundroll_engine::bus::EventBus;
use groundroll_engine::clock::SimClock;
use groundroll_engine::control::{ControlSignalSource, NullSignalSource, SimulationControl};
use groundroll_engine::monitor::EventMonitor;
use groundroll_engine::queue::StateUpdateQueue;
use groundroll_engine::state_manager::StateManager;
use groundroll_obs::logging::{DualSink, LogError};
use groundroll_obs::recorder::{CsvRecorder, RecorderError, RecorderWorker};

use crate::config::ScenarioConfig;

/// Seed hook signature: runs inside [`SharedState::create`].
pub type SeedFn = Box<dyn FnOnce(&SharedState) -> Result<(), InitError> + Send>;
/// Event-state hook signature: runs on the manager's dispatch worker.
pub type EventHook = Arc<dyn Fn(&SharedState, &str) + Send + Sync>;

/// A complete scenario bundle.
pub struct Scenario {
    /// Scenario name, used in logs and the run report.
    pub name: &'static str,
    /// Numeric parameters.
    pub config: ScenarioConfig,
    /// The declarative event table.
    pub events: EventTable,
    /// Seeds the shared state before any worker starts.
    pub seed: SeedFn,
    /// Runs when an event latches, before its actions execute.
    pub on_event: EventHook,
}

/// Everything the runner needs besides the scenario itself.
pub struct RunnerOptions {
    /// Directory receiving `data.csv` and the log files.
    pub output_dir: PathBuf,
    /// Action-name to controller mapping.
    pub actions: groundroll_core::ActionTable,
    /// Airframe parameters.
    pub aircraft: Arc<dyn AircraftConfig>,
    /// Force model.
    pub force_model: Arc<dyn ForceModel>,
    /// Integration scheme.
    pub dynamics: Arc<dyn DynamicsModel>,
    /// Operator control surface.
    pub signals: Box<dyn ControlSignalSource>,
    /// Install the dual-sink process logger before starting.
    pub install_logger: bool,
}

impl RunnerOptions {
    /// Default options for an unattended run: AC1 airframe, linear
    /// models, built-in action table, no operator signals, no process
    /// logger.
    pub fn headless(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            actions: crate::actions::default_table(),
            aircraft: Arc::new(Ac1),
            force_model: Arc::new(LinearForceModel),
            dynamics: Arc::new(LinearDynamics),
            signals: Box::new(NullSignalSource),
            install_logger: false,
        }
    }

    /// Enable the dual-sink process logger (console mirror included).
    pub fn with_logger(mut self) -> Self {
        self.install_logger = true;
        self
    }
}

/// Errors that abort a scenario before or during startup.
#[derive(Debug)]
pub enum ScenarioError {
    /// The shared-state initialization hook failed.
    Init(InitError),
    /// A log sink could not be opened.
    Log(LogError),
    /// The data recorder sink could not be opened.
    Recorder(RecorderError),
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "state initialization: {e}"),
            Self::Log(e) => write!(f, "log sink: {e}"),
            Self::Recorder(e) => write!(f, "data recorder: {e}"),
        }
    }
}

impl Error for ScenarioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Init(e) => Some(e),
            Self::Log(e) => Some(e),
            Self::Recorder(e) => Some(e),
        }
    }
}

impl From<InitError> for ScenarioError {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

impl From<LogError> for ScenarioError {
    fn from(e: LogError) -> Self {
        Self::Log(e)
    }
}

impl From<RecorderError> for ScenarioError {
    fn from(e: RecorderError) -> Self {
        Self::Recorder(e)
    }
}

/// Summary of a completed run.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Scenario name.
    pub scenario: &'static str,
    /// Ticks the clock published.
    pub steps: u64,
    /// Final simulated time (s).
    pub final_time: f64,
    /// Final committed snapshot.
    pub snapshot: StateSnapshot,
    /// Snapshot version at shutdown.
    pub state_version: u64,
    /// Events whose action lists executed, in table order.
    pub triggered_events: Vec<String>,
}

/// Run a scenario to completion.
///
/// Blocks the calling thread until `simulation_running` goes false —
/// via the scenario's final-stop hook, an operator terminate signal, or
/// the control worker's auto-termination limits.
pub fn run(scenario: Scenario, options: RunnerOptions) -> Result<RunReport, ScenarioError> {
    let Scenario {
        name,
        config,
        events,
        seed,
        on_event,
    } = scenario;

    if options.install_logger {
        match DualSink::install(&options.output_dir) {
            Ok(()) => {}
            Err(LogError::AlreadyInstalled) => {
                log::debug!("[runner] process logger already installed")
            }
            Err(e) => return Err(e.into()),
        }
    }
    log::info!("========= scenario {name} starting =========");

    let state = SharedState::create(seed)?;
    let clock = Arc::new(SimClock::new(config.simulation_time_step));
    let queue = StateUpdateQueue::new();
    let bus = Arc::new(EventBus::new());

    let manager = ControllerManager::new(
        Arc::clone(&state),
        Arc::clone(&clock),
        queue.clone(),
        options.actions,
        ControllerRates {
            throttle_increase_rate: config.throttle_increase_rate,
            throttle_decrease_rate: config.throttle_decrease_rate,
            brake_rate: config.brake_rate,
            cruise_gain: 0.1,
        },
    );
    let event_names: Vec<String> = events.keys().cloned().collect();
    manager.set_event_definitions(events.clone());
    {
        let state = Arc::clone(&state);
        manager.set_event_callback(Box::new(move |event| on_event(&state, event)));
    }
    manager.setup_event_handlers(&bus);

    // The recorder sink must open before any worker starts.
    let recorder = CsvRecorder::create_file(&options.output_dir.join("data.csv"))?;

    state.simulation_running.store(true, Ordering::Release);
    // Unattended runs self-confirm; an interactive front-end would call
    // confirm() from its own control surface instead.
    state.confirm();
    state.notify_start();

    let mut control = SimulationControl::start(
        Arc::clone(&state),
        Arc::clone(&clock),
        options.signals,
    );
    let clock_thread = {
        let clock = Arc::clone(&clock);
        thread::Builder::new()
            .name("sim-clock".into())
            .spawn(move || clock.start())
            .expect("spawn clock thread")
    };
    let mut state_manager =
        StateManager::start(Arc::clone(&state), queue.clone(), Arc::clone(&clock));
    let mut monitor = EventMonitor::start(
        Arc::clone(&state),
        Arc::clone(&bus),
        Arc::new(events),
        Arc::clone(&clock),
    );
    manager.start();
    let mut dynamics = DynamicsWorker::start(
        Arc::clone(&state),
        queue.clone(),
        Arc::clone(&clock),
        options.aircraft,
        options.force_model,
        options.dynamics,
    );
    let mut recorder_worker =
        RecorderWorker::start(Arc::clone(&state), Arc::clone(&clock), recorder);
    log::info!("[runner] all workers started, dt={}s", config.simulation_time_step);

    while state.simulation_running.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(100));
    }
    log::info!("[runner] run finished, shutting down workers");

    // Release the barrier first so every synced worker unblocks.
    clock.stop();
    recorder_worker.stop();
    dynamics.stop();
    manager.stop();
    monitor.stop();
    state_manager.stop();
    control.stop();
    let _ = clock_thread.join();
    bus.shutdown();

    let report = RunReport {
        scenario: name,
        steps: clock.step_count(),
        final_time: clock.current_time(),
        snapshot: state.snapshot(),
        state_version: state.state_version(),
        triggered_events: event_names
            .into_iter()
            .filter(|event| manager.is_event_triggered(event))
            .collect(),
    };
    log::info!(
        "========= scenario {name} done: {} steps, t={:.2}s, x={:.2}m =========",
        report.steps,
        report.final_time,
        report.snapshot.position,
    );
    Ok(report)
}
