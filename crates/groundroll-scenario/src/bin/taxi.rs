//! Taxi scenario entry point.
//!
//! Reads `taxi_config.txt` and `controller_actions_config.txt` from the
//! working directory (falling back to built-in defaults) and writes
//! logs and `data.csv` under `output/`.

use std::path::Path;
use std::process::ExitCode;

use groundroll_scenario::{actions, runner, taxi, ScenarioConfig};

fn main() -> ExitCode {
    let config = ScenarioConfig::load(Path::new("taxi_config.txt"));
    let mut options = runner::RunnerOptions::headless("output").with_logger();
    options.actions = actions::load(Path::new("controller_actions_config.txt"));

    match runner::run(taxi::scenario(config), options) {
        Ok(report) => {
            log::info!(
                "taxi run complete: {} steps, events {:?}",
                report.steps,
                report.triggered_events,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("taxi scenario failed to start: {e}");
            ExitCode::FAILURE
        }
    }
}
