//! Abort-takeoff scenario entry point.
//!
//! Reads `abort_takeoff_config.txt` and `controller_actions_config.txt`
//! from the working directory (falling back to built-in defaults) and
//! writes logs and `data.csv` under `output/`.

use std::path::Path;
use std::process::ExitCode;

use groundroll_scenario::{abort, actions, runner, ScenarioConfig};

fn main() -> ExitCode {
    let config = ScenarioConfig::load(Path::new("abort_takeoff_config.txt"));
    let mut options = runner::RunnerOptions::headless("output").with_logger();
    options.actions = actions::load(Path::new("controller_actions_config.txt"));

    match runner::run(abort::scenario(config), options) {
        Ok(report) => {
            log::info!(
                "abort-takeoff run complete: {} steps, events {:?}",
                report.steps,
                report.triggered_events,
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("abort-takeoff scenario failed to start: {e}");
            ExitCode::FAILURE
        }
    }
}
