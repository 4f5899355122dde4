//! Longitudinal force models.
//!
//! Both models compute the same breakdown: thrust from throttle, drag
//! opposing the direction of motion, wheel brake force with a speed
//! factor, and a static-friction gate that pins the vehicle while the
//! net force cannot overcome breakaway friction.

use std::sync::Arc;

use groundroll_core::SharedState;

use crate::aircraft::AircraftConfig;

/// Air density at sea level (kg/m³).
pub const AIR_DENSITY: f64 = 1.225;
/// Frontal reference area (m²).
pub const FRONTAL_AREA: f64 = 50.0;
/// Gravitational acceleration (m/s²).
const GRAVITY: f64 = 9.81;
/// Below this speed the vehicle is treated as static (m/s).
const STATIC_SPEED_EPS: f64 = 0.01;

/// The per-tick force breakdown committed to the shared state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceBreakdown {
    /// Net longitudinal force after the static-friction gate (N).
    pub net_force: f64,
    /// Engine thrust (N).
    pub thrust: f64,
    /// Aerodynamic drag, signed with the direction of motion (N).
    pub drag: f64,
    /// Wheel brake force (N).
    pub brake_force: f64,
    /// Breakaway friction while static, zero while moving (N).
    pub static_friction: f64,
}

/// A longitudinal force model.
pub trait ForceModel: Send + Sync {
    /// Compute the force breakdown for the current controls and velocity.
    fn net_force(
        &self,
        state: &SharedState,
        velocity: f64,
        aircraft: &Arc<dyn AircraftConfig>,
    ) -> ForceBreakdown;
}

/// Apply the static-friction gate to a provisional net force.
///
/// While static, a net force below breakaway friction resolves to zero;
/// otherwise friction is subtracted in the direction of the net force.
fn static_gate(net_force: f64, static_friction: f64) -> f64 {
    if net_force.abs() < static_friction {
        0.0
    } else {
        net_force - static_friction * net_force.signum()
    }
}

/// The linear force model.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearForceModel;

impl ForceModel for LinearForceModel {
    fn net_force(
        &self,
        state: &SharedState,
        velocity: f64,
        aircraft: &Arc<dyn AircraftConfig>,
    ) -> ForceBreakdown {
        let thrust = state.throttle.load() * aircraft.max_thrust();

        // v·|v| keeps drag opposed to the direction of motion.
        let drag =
            0.5 * AIR_DENSITY * FRONTAL_AREA * aircraft.drag_coefficient() * velocity * velocity.abs();

        let (brake_force, static_friction) = if velocity.abs() < STATIC_SPEED_EPS {
            let normal_force = aircraft.mass() * GRAVITY;
            (0.0, aircraft.static_friction_coefficient() * normal_force)
        } else {
            let speed_factor = (velocity.abs() / 50.0).clamp(0.3, 1.0);
            (
                state.brake.load() * aircraft.max_brake_force() * speed_factor,
                0.0,
            )
        };

        let mut net_force = thrust - drag - brake_force;
        if velocity.abs() < STATIC_SPEED_EPS {
            net_force = static_gate(net_force, static_friction);
        }

        ForceBreakdown {
            net_force,
            thrust,
            drag,
            brake_force,
            static_friction,
        }
    }
}

/// Nonlinear variant: deterministic sinusoidal perturbations of thrust,
/// drag coefficient, and brake efficiency.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonlinearForceModel;

impl ForceModel for NonlinearForceModel {
    fn net_force(
        &self,
        state: &SharedState,
        velocity: f64,
        aircraft: &Arc<dyn AircraftConfig>,
    ) -> ForceBreakdown {
        let thrust =
            state.throttle.load() * aircraft.max_thrust() * (1.0 - 0.1 * (velocity / 10.0).sin());

        let drag_coeff = aircraft.drag_coefficient() * (1.0 + 0.05 * velocity.abs() / 100.0);
        let drag = 0.5 * AIR_DENSITY * FRONTAL_AREA * drag_coeff * velocity * velocity.abs();

        let (brake_force, static_friction) = if velocity.abs() < STATIC_SPEED_EPS {
            let normal_force = aircraft.mass() * GRAVITY;
            (0.0, aircraft.static_friction_coefficient() * normal_force)
        } else {
            // Brake efficiency falls off with speed more aggressively
            // than the linear model, with a slow ripple on top.
            let speed_factor = (velocity.abs() / 60.0).clamp(0.2, 1.0);
            let ripple = 1.0 - 0.1 * (velocity / 15.0).cos();
            (
                state.brake.load() * aircraft.max_brake_force() * speed_factor * ripple,
                0.0,
            )
        };

        let mut net_force = thrust - drag - brake_force;
        if velocity.abs() < STATIC_SPEED_EPS {
            net_force = static_gate(net_force, static_friction);
        }

        ForceBreakdown {
            net_force,
            thrust,
            drag,
            brake_force,
            static_friction,
        }
    }
}
