//! The Abort-Takeoff scenario: accelerate under auto control, abort at
//! the decision speed, brake down, taxi back at cruise speed, stop.
//!
//! The abort latch (`abort_triggered`) is set by the event-state hook
//! when ABORT_TAKEOFF fires; the later events key on it so a slow roll
//! through the same speeds cannot re-trigger the abort chain.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::event::{table_from, EventDefinition};
use groundroll_core::{ControllerAction, EventTable, SharedState};

use crate::config::ScenarioConfig;
use crate::runner::Scenario;

/// Position at which unconditional braking begins (m).
pub const BRAKE_MARKER: f64 = 1000.0;
/// Speed below which the post-abort taxi-back may start (m/s), 15 km/h.
pub const TAXI_BACK_SPEED: f64 = 4.17;
/// Position bound for the taxi-back leg (m).
pub const TAXI_BACK_LIMIT: f64 = 1500.0;

/// The scenario's event table.
pub fn event_table(config: &ScenarioConfig) -> EventTable {
    let abort_speed = config.abort_speed;
    let stop_speed = config.zero_velocity_threshold;
    table_from([
        EventDefinition::new(
            "START_THROTTLE",
            "hand control to the auto system and open the throttle",
            |state: &SharedState| {
                state.simulation_started.load(Ordering::Acquire)
                    && state.simulation_running.load(Ordering::Acquire)
                    && state.simulation_time.load() >= 1.0
            },
            [
                ControllerAction::SwitchToAutoMode,
                ControllerAction::StartThrottleIncrease,
            ],
        ),
        EventDefinition::new(
            "ABORT_TAKEOFF",
            "abort at the decision speed",
            move |state: &SharedState| {
                state.velocity.load() >= abort_speed
                    && !state.abort_triggered.load(Ordering::Acquire)
            },
            [
                ControllerAction::StopThrottleIncrease,
                ControllerAction::StartThrottleDecrease,
                ControllerAction::StartBrake,
            ],
        ),
        EventDefinition::new(
            "START_CRUISE",
            "taxi back at cruise speed once the abort has slowed the roll",
            |state: &SharedState| {
                state.velocity.load() <= TAXI_BACK_SPEED
                    && state.position.load() < TAXI_BACK_LIMIT
                    && state.abort_triggered.load(Ordering::Acquire)
            },
            [
                ControllerAction::StopThrottleDecrease,
                ControllerAction::StopBrake,
                ControllerAction::StartCruise,
            ],
        ),
        EventDefinition::new(
            "START_BRAKE",
            "brake unconditionally at the 1000 m marker",
            |state: &SharedState| state.position.load() >= BRAKE_MARKER,
            [ControllerAction::StartBrake],
        ),
        EventDefinition::new(
            "FINAL_STOP",
            "stop everything once the aborted roll is at rest past the marker",
            move |state: &SharedState| {
                state.velocity.load() <= stop_speed
                    && state.position.load() >= BRAKE_MARKER
                    && state.abort_triggered.load(Ordering::Acquire)
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
    let cruise_speed = config.cruise_speed;
    Scenario {
        name: "abort_takeoff",
        config,
        events,
        seed: Box::new(move |state: &SharedState| {
            state.position.store(0.0);
            state.velocity.store(0.0);
            state.throttle.store(0.0);
            state.brake.store(0.0);
            state.target_speed.store(config.target_speed);
            state.abort_speed.store(config.abort_speed);
            state.abort_speed_threshold.store(config.abort_speed);
            state.abort_triggered.store(false, Ordering::Release);
            state.throttle_control_enabled.store(false, Ordering::Release);
            state.brake_control_enabled.store(false, Ordering::Release);
            state.cruise_control_enabled.store(false, Ordering::Release);
            state.final_stop_enabled.store(false, Ordering::Release);
            Ok(())
        }),
        on_event: Arc::new(move |state: &SharedState, event: &str| match event {
            "ABORT_TAKEOFF" => {
                state.abort_triggered.store(true, Ordering::Release);
                log::info!("[abort-takeoff] abort latched");
            }
            "START_CRUISE" => {
                // The taxi-back leg holds cruise speed, not the takeoff
                // target.
                state.target_speed.store(cruise_speed);
            }
            "FINAL_STOP" => {
                state.notify_final_stop();
                state.simulation_running.store(false, Ordering::Release);
                state.notify_shutdown();
            }
            _ => {}
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
    fn abort_fires_at_decision_speed_only_before_the_latch() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("ABORT_TAKEOFF").unwrap().predicate;

        let state = armed_state();
        state.velocity.store(39.9);
        assert!(!predicate(&state));
        state.velocity.store(40.0);
        assert!(predicate(&state));

        // Latched: crossing the speed again must not re-fire.
        state.abort_triggered.store(true, Ordering::Release);
        assert!(!predicate(&state));
    }

    #[test]
    fn taxi_back_requires_the_abort_latch() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("START_CRUISE").unwrap().predicate;

        let state = armed_state();
        state.velocity.store(3.0);
        state.position.store(800.0);
        assert!(!predicate(&state), "no abort, no taxi-back");

        state.abort_triggered.store(true, Ordering::Release);
        assert!(predicate(&state));

        state.position.store(TAXI_BACK_LIMIT);
        assert!(!predicate(&state), "beyond the limit, no taxi-back");
    }

    #[test]
    fn final_stop_requires_abort_and_position() {
        let table = event_table(&ScenarioConfig::default());
        let predicate = &table.get("FINAL_STOP").unwrap().predicate;

        let state = armed_state();
        state.velocity.store(0.05);
        state.position.store(1100.0);
        assert!(!predicate(&state), "needs the abort latch");

        state.abort_triggered.store(true, Ordering::Release);
        assert!(predicate(&state));

        state.position.store(900.0);
        assert!(!predicate(&state), "needs to be past the brake marker");
    }

    #[test]
    fn seed_stores_speed_targets() {
        let scenario = scenario(ScenarioConfig::default());
        let state = SharedState::default();
        (scenario.seed)(&state).unwrap();
        assert_eq!(state.target_speed.load(), 30.0);
        assert_eq!(state.abort_speed.load(), 40.0);
        assert!(!state.abort_triggered.load(Ordering::Acquire));
    }

    #[test]
    fn hook_latches_abort_and_retargets_cruise() {
        let scenario = scenario(ScenarioConfig::default());
        let state = SharedState::default();
        (scenario.seed)(&state).unwrap();

        (scenario.on_event)(&state, "ABORT_TAKEOFF");
        assert!(state.abort_triggered.load(Ordering::Acquire));

        (scenario.on_event)(&state, "START_CRUISE");
        assert_eq!(state.target_speed.load(), 3.0);
    }

    #[test]
    fn events_evaluate_in_script_order() {
        let table = event_table(&ScenarioConfig::default());
        let names: Vec<_> = table.keys().cloned().collect();
        assert_eq!(
            names,
            ["START_THROTTLE", "ABORT_TAKEOFF", "START_CRUISE", "START_BRAKE", "FINAL_STOP"]
        );
    }
}
