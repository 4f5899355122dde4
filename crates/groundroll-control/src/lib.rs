//! Control loops for the groundroll flight-dynamics simulator.
//!
//! Five controllers share one capability contract ([`Controller`]):
//! throttle-up, throttle-down, brake, runway cruise, and pitch hold.
//! Each owns a clock-synchronized worker whose per-tick body runs only
//! while its enable flag in the shared state is set. The
//! [`ControllerManager`](manager::ControllerManager) owns the roster and
//! translates bus events into controller lifecycle operations.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod brake;
pub mod controller;
pub mod cruise;
pub mod manager;
pub mod pitch;
pub mod throttle;

pub use brake::BrakeController;
pub use controller::{Controller, ControllerRates};
pub use cruise::CruiseController;
pub use manager::{ControllerManager, EventStateCallback};
pub use pitch::PitchHoldController;
pub use throttle::{ThrottleDecrease, ThrottleIncrease};
