//! Simulation kernel for the groundroll flight-dynamics simulator.
//!
//! Provides the tick-barrier [`SimClock`](clock::SimClock) that advances
//! simulated time only after every registered worker reports completion,
//! the state-update queue and its manager worker, the event bus with its
//! clock-synchronized monitor, and the scenario control surface.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bus;
pub mod clock;
pub mod control;
pub mod monitor;
pub mod queue;
pub mod state_manager;

pub use bus::{EventBus, EventStats};
pub use clock::{run_synced, SimClock, WorkerRegistration, DEFAULT_TIME_STEP};
pub use control::{ControlSignal, ControlSignalSource, NullSignalSource, SimulationControl};
pub use monitor::EventMonitor;
pub use queue::StateUpdateQueue;
pub use state_manager::StateManager;
