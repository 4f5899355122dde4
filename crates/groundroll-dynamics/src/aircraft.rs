//! Aircraft parameter sets.
//!
//! The simulator treats airframe data as a read-only capability: the
//! force models and integrator only ever call these scalar accessors, so
//! swapping airframes is a one-line change in the scenario binary.

/// Read-only physical parameters of an airframe.
pub trait AircraftConfig: Send + Sync {
    /// Vehicle mass (kg).
    fn mass(&self) -> f64;
    /// Maximum engine thrust (N).
    fn max_thrust(&self) -> f64;
    /// Minimum engine thrust (N).
    fn min_thrust(&self) -> f64;
    /// Maximum wheel brake force (N).
    fn max_brake_force(&self) -> f64;
    /// Aerodynamic drag coefficient.
    fn drag_coefficient(&self) -> f64;
    /// Static friction coefficient between tires and runway.
    fn static_friction_coefficient(&self) -> f64;
}

/// The AC1 fixed-wing airframe.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ac1;

impl AircraftConfig for Ac1 {
    fn mass(&self) -> f64 {
        80_000.0
    }
    fn max_thrust(&self) -> f64 {
        500_000.0
    }
    fn min_thrust(&self) -> f64 {
        0.0
    }
    fn max_brake_force(&self) -> f64 {
        400_000.0
    }
    fn drag_coefficient(&self) -> f64 {
        0.02
    }
    fn static_friction_coefficient(&self) -> f64 {
        0.02
    }
}

/// The AC2 fixed-wing airframe, a slightly heavier sibling of [`Ac1`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Ac2;

impl AircraftConfig for Ac2 {
    fn mass(&self) -> f64 {
        85_000.0
    }
    fn max_thrust(&self) -> f64 {
        520_000.0
    }
    fn min_thrust(&self) -> f64 {
        0.0
    }
    fn max_brake_force(&self) -> f64 {
        420_000.0
    }
    fn drag_coefficient(&self) -> f64 {
        0.021
    }
    fn static_friction_coefficient(&self) -> f64 {
        0.021
    }
}
