//! Groundroll: a barrier-synchronized longitudinal flight-dynamics
//! simulator.
//!
//! This is the top-level facade crate re-exporting the public API from
//! the groundroll sub-crates. For most users, adding `groundroll` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```no_run
//! use groundroll::prelude::*;
//!
//! // Run the bundled Taxi scenario headless, writing output/ files.
//! let config = ScenarioConfig::default();
//! let report = run(
//!     groundroll::scenario::taxi::scenario(config),
//!     RunnerOptions::headless("output"),
//! )
//! .unwrap();
//! println!("stopped at {:.1} m after {} ticks", report.snapshot.position, report.steps);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `groundroll-core` | shared state, updates, actions, events |
//! | [`engine`] | `groundroll-engine` | clock, queue, state manager, bus, monitor |
//! | [`control`] | `groundroll-control` | controllers and the controller manager |
//! | [`dynamics`] | `groundroll-dynamics` | airframes, force models, integrator |
//! | [`obs`] | `groundroll-obs` | log sink and CSV recorder |
//! | [`scenario`] | `groundroll-scenario` | config parsing, scenarios, runner |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub use groundroll_control as control;
pub use groundroll_core as types;
pub use groundroll_dynamics as dynamics;
pub use groundroll_engine as engine;
pub use groundroll_obs as obs;
pub use groundroll_scenario as scenario;

/// The most commonly used types, re-exported flat.
pub mod prelude {
    pub use groundroll_control::{Controller, ControllerManager, ControllerRates};
    pub use groundroll_core::{
        ControllerAction, EventDefinition, EventPayload, FlightMode, SharedState, StateSnapshot,
        StateUpdate, StateUpdateKind,
    };
    pub use groundroll_dynamics::{
        Ac1, Ac2, AircraftConfig, ForceModel, LinearDynamics, LinearForceModel,
        NonlinearDynamics, NonlinearForceModel,
    };
    pub use groundroll_engine::{EventBus, EventMonitor, SimClock, StateManager, StateUpdateQueue};
    pub use groundroll_scenario::{run, RunReport, RunnerOptions, Scenario, ScenarioConfig};
}
