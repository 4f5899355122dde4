//! End-to-end run of the full kernel: clock barrier, state manager,
//! event monitor, controller manager, dynamics integrator, and data
//! recorder, all on real threads.
//!
//! The script is a compressed taxi: aggressive ramp rates and short
//! markers so the whole roll fits in a few hundred ticks.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use groundroll_core::event::{table_from, EventDefinition};
use groundroll_core::{ControllerAction, FlightMode, SharedState};
use groundroll_scenario::runner::{self, RunnerOptions, Scenario};
use groundroll_scenario::ScenarioConfig;

const HALT_MARKER: f64 = 1.0;
const STOP_SPEED: f64 = 0.05;

fn sprint_scenario() -> Scenario {
    let config = ScenarioConfig {
        throttle_increase_rate: 50.0,
        throttle_decrease_rate: 50.0,
        brake_rate: 50.0,
        zero_velocity_threshold: STOP_SPEED,
        ..ScenarioConfig::default()
    };

    let events = table_from([
        EventDefinition::new(
            "GO",
            "open the throttle almost immediately",
            |state: &SharedState| state.simulation_time.load() >= 0.05,
            [ControllerAction::StartThrottleIncrease],
        ),
        EventDefinition::new(
            "HALT",
            "brake at the one-metre marker",
            |state: &SharedState| state.position.load() >= HALT_MARKER,
            [
                ControllerAction::StopThrottleIncrease,
                ControllerAction::StartThrottleDecrease,
                ControllerAction::StartBrake,
            ],
        ),
        EventDefinition::new(
            "FINAL_STOP",
            "done once stopped past the marker",
            |state: &SharedState| {
                state.position.load() >= HALT_MARKER && state.velocity.load() <= STOP_SPEED
            },
            [
                ControllerAction::StopAllControllers,
                ControllerAction::SwitchToManualMode,
            ],
        ),
    ]);

    Scenario {
        name: "sprint",
        config,
        events,
        seed: Box::new(|state: &SharedState| {
            state.position.store(0.0);
            state.velocity.store(0.0);
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

#[test]
fn sprint_runs_to_final_stop() {
    let dir = tempfile::tempdir().unwrap();
    let report = runner::run(sprint_scenario(), RunnerOptions::headless(dir.path())).unwrap();

    // All three events latched, in table order.
    assert_eq!(report.triggered_events, ["GO", "HALT", "FINAL_STOP"]);

    // The vehicle rolled past the marker and came back to rest.
    assert!(report.snapshot.position >= HALT_MARKER);
    assert!(report.snapshot.velocity <= STOP_SPEED);

    // Committed-tick invariants.
    assert!((0.0..=1.0).contains(&report.snapshot.throttle));
    assert!((0.0..=1.0).contains(&report.snapshot.brake));
    assert!(report.snapshot.velocity >= 0.0);

    // The clock and the state version both advanced.
    assert!(report.steps > 10);
    assert!(report.state_version > 0);
    let expected_time = report.steps as f64 * 0.01;
    assert!(
        (report.final_time - expected_time).abs() < 1e-6,
        "time {} != steps*dt {}",
        report.final_time,
        expected_time
    );

    // The recorder produced a strictly increasing series.
    let csv = std::fs::read_to_string(dir.path().join("data.csv")).unwrap();
    let times: Vec<f64> = csv
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().next().unwrap().parse().unwrap())
        .collect();
    assert!(times.len() >= 2, "expected recorded rows, got {}", times.len());
    assert_eq!(times[0], 0.0);
    for pair in times.windows(2) {
        assert!(pair[1] > pair[0], "recorder times not strictly increasing");
    }
}

#[test]
fn init_hook_failure_aborts_before_workers_start() {
    let mut scenario = sprint_scenario();
    scenario.seed = Box::new(|_state: &SharedState| {
        Err(groundroll_core::InitError::Hook {
            reason: "refused".to_string(),
        })
    });

    let dir = tempfile::tempdir().unwrap();
    let result = runner::run(scenario, RunnerOptions::headless(dir.path()));
    assert!(matches!(
        result,
        Err(runner::ScenarioError::Init(groundroll_core::InitError::Hook { .. }))
    ));
    // No worker ran, so no data file was produced.
    assert!(!dir.path().join("data.csv").exists());
}
