//! The Taxi scenario: throttle up, roll to the 500 m marker, brake to
//! a stop.
//!
//! The seed grants the auto system shared authority (SemiAuto) so the
//! scripted controllers pass the manager's authority gate; the final
//! stop hands control back to the pilot.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::event::{table_from, EventDefinition};
use groundroll_core::{ControllerAction, EventTable, FlightMode, SharedState};

use crate::config::ScenarioConfig;
use crate::runner::Scenario;

/// Position at which braking begins (m).
pub const BRAKE_MARKER: f64 = 500.0;
/// Initial position on the taxiway (m).
pub const INITIAL_POSITION: f64 = 30.0;

/// The scenario's event table.
pub fn event_table(config: &ScenarioConfig) -> EventTable {
    let stop_speed = config.zero_velocity_threshold;
    table_from([
        EventDefinition::new(
            "START_THROTTLE",
            "open the throttle one second into the run",
            |state: &SharedState| {
                state.simulation_started.load(Ordering::Acquire)
                    && state.simulation_running.load(Ordering::Acquire)
                    && state.simulation_time.load() >= 1.0
            },
            [ControllerAction::StartThrottleIncrease],
        ),
        EventDefinition::new(
            "START_BRAKE",
            "begin braking at the 500 m marker",
            |state: &SharedState| state.position.load() >= BRAKE_MARKER,
            [
                ControllerAction::StartThrottleDecrease,
                ControllerAction::StartBrake,
            ],
        ),
        EventDefinition::new(
            "FINAL_STOP",
            "stop everything once the vehicle is at rest past the brake marker",
            move |state: &SharedState| {
                state.position.load() >= BRAKE_MARKER && state.velocity.load() <= stop_speed
            },
            [
                ControllerAction::StopAllControllers,
                ControllerAction::SwitchToManualMode,
            ],
        ),
    ])
}

/// Build the full scenario bundle.
pub fn scenario(config: ScenarioConfig) -> Scenario {
    let events = event_table(&config);
    Scenario {
        name: "taxi",
        config,
        events,
        seed: Box::new(move |state: &SharedState| {
            state.position.store(INITIAL_POSITION);
            state.velocity.store(0.0);
            state.throttle.store(0.0);
            state.brake.store(0.0);
            state.target_speed.store(config.target_speed);
            state.throttle_control_enabled.store(false, Ordering::Release);
            state.brake_control_enabled.store(false, Ordering::Release);
            state.cruise_control_enabled.store(false, Ordering::Release);
            state.final_stop_enabled.store(false, Ordering::Release);
            // The taxi script drives the auto controllers without ever
            // switching modes, so the seed shares authority up front.
            state.set_flight_mode(FlightMode::SemiAuto);
            Ok(())
        }),
        on_event: Arc::new(|state: &SharedState, event: &str| {
            if event == "FINAL_STOP" {
                state.notify_final_stop();
                state.simulation_running.store(false, Ordering::Release);
                state.notify_shutdown();
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armed_state() -> SharedState {
        let state = SharedState::default();
        state.simulation_started.store(true, Ordering::Release);
        state.simulation_running.store(true, Ordering::Release);
        state
    }

    #[test]
    fn start_throttle_waits_for_one_second() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("START_THROTTLE").unwrap().predicate;

        let state = armed_state();
        state.simulation_time.store(0.5);
        assert!(!predicate(&state));
        state.simulation_time.store(1.0);
        assert!(predicate(&state));
    }

    #[test]
    fn start_throttle_requires_running_simulation() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("START_THROTTLE").unwrap().predicate;

        let state = SharedState::default();
        state.simulation_time.store(5.0);
        assert!(!predicate(&state), "must not fire before the run starts");
    }

    #[test]
    fn start_brake_fires_at_the_marker() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("START_BRAKE").unwrap().predicate;

        let state = armed_state();
        state.position.store(499.9);
        assert!(!predicate(&state));
        state.position.store(500.0);
        assert!(predicate(&state));
    }

    #[test]
    fn final_stop_cannot_fire_at_standstill_before_the_roll() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("FINAL_STOP").unwrap().predicate;

        // v = 0 at the start line must not end the scenario.
        let state = armed_state();
        state.position.store(INITIAL_POSITION);
        assert!(!predicate(&state));

        // Stopped past the brake marker does.
        state.position.store(620.0);
        state.velocity.store(0.05);
        assert!(predicate(&state));
    }

    #[test]
    fn seed_initializes_kinematics_and_authority() {
        let scenario = scenario(ScenarioConfig::default());
        let state = SharedState::default();
        (scenario.seed)(&state).unwrap();

        assert_eq!(state.position.load(), INITIAL_POSITION);
        assert_eq!(state.velocity.load(), 0.0);
        assert_eq!(state.target_speed.load(), 30.0);
        assert!(state.auto_has_throttle_control());
        assert!(state.auto_has_brake_control());
        assert!(state.pilot_has_throttle_control());
    }

    #[test]
    fn final_stop_hook_ends_the_run() {
        let scenario = scenario(ScenarioConfig::default());
        let state = SharedState::default();
        state.simulation_running.store(true, Ordering::Release);

        (scenario.on_event)(&state, "START_BRAKE");
        assert!(state.simulation_running.load(Ordering::Acquire));

        (scenario.on_event)(&state, "FINAL_STOP");
        assert!(!state.simulation_running.load(Ordering::Acquire));
        assert!(state.final_stop_enabled.load(Ordering::Acquire));
    }

    #[test]
    fn table_is_ordered_for_deterministic_evaluation() {
        let table = event_table(&ScenarioConfig::default());
        let names: Vec<_> = table.keys().cloned().collect();
        assert_eq!(names, ["START_THROTTLE", "START_BRAKE", "FINAL_STOP"]);
    }
}
