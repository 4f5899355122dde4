//! State-update messages flowing from producers (controllers, dynamics
//! integrator) to the single consumer (the state manager).

/// Which scalar field of the shared state an update targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateUpdateKind {
    /// Longitudinal position (m).
    Position,
    /// Longitudinal velocity (m/s).
    Velocity,
    /// Longitudinal acceleration (m/s²).
    Acceleration,
    /// Throttle setting.
    Throttle,
    /// Brake setting.
    Brake,
}

/// A tagged scalar write, applied by the state manager during its tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateUpdate {
    /// The targeted field.
    pub kind: StateUpdateKind,
    /// The new value.
    pub value: f64,
}

impl StateUpdate {
    /// Convenience constructor.
    pub fn new(kind: StateUpdateKind, value: f64) -> Self {
        Self { kind, value }
    }
}
