//! Vehicle dynamics for the groundroll flight-dynamics simulator.
//!
//! Force models compute the longitudinal force breakdown from the
//! current controls; the integrator worker turns net force into
//! acceleration, velocity and position each tick and feeds the results
//! through the state-update queue.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod aircraft;
pub mod forces;
pub mod integrator;

pub use aircraft::{Ac1, Ac2, AircraftConfig};
pub use forces::{ForceBreakdown, ForceModel, LinearForceModel, NonlinearForceModel};
pub use integrator::{DynamicsModel, DynamicsWorker, LinearDynamics, NonlinearDynamics};
