//! Scenario parameter files.
//!
//! Line-oriented `KEY = value` format: blank lines and `#` comments are
//! skipped, unknown keys are warned and ignored, malformed values keep
//! their defaults. Config problems are never fatal — a missing file
//! just means a run on defaults.

use std::fs;
use std::path::Path;

/// Numeric parameters of a scenario run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScenarioConfig {
    /// Takeoff/cruise target speed written to the shared state (m/s).
    pub target_speed: f64,
    /// Abort decision speed (m/s).
    pub abort_speed: f64,
    /// Post-abort taxi-back cruise speed (m/s).
    pub cruise_speed: f64,
    /// Brake ramp rate (1/s).
    pub brake_rate: f64,
    /// Throttle-up ramp rate (1/s).
    pub throttle_increase_rate: f64,
    /// Throttle-down ramp rate (1/s).
    pub throttle_decrease_rate: f64,
    /// Simulation time step (s).
    pub simulation_time_step: f64,
    /// Speed below which the vehicle counts as stopped (m/s).
    pub zero_velocity_threshold: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            target_speed: 30.0,
            abort_speed: 40.0,
            cruise_speed: 3.0,
            brake_rate: 0.2,
            throttle_increase_rate: 0.1,
            throttle_decrease_rate: 0.2,
            simulation_time_step: 0.01,
            zero_velocity_threshold: 0.1,
        }
    }
}

impl ScenarioConfig {
    /// Load from a config file, falling back to defaults if it is
    /// missing.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(_) => {
                log::warn!(
                    "[config] {} not found, using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Parse config text over the defaults.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("[config] line {}: missing '=': {line}", index + 1);
                continue;
            };
            let key = key.trim();
            let value = value.trim();
            let parsed: f64 = match value.parse() {
                Ok(v) => v,
                Err(_) => {
                    log::warn!("[config] line {}: bad value for {key}: {value}", index + 1);
                    continue;
                }
            };
            config.apply(key, parsed);
        }
        config
    }

    fn apply(&mut self, key: &str, value: f64) {
        match key {
            "target_speed" => self.target_speed = value,
            "abort_speed" => self.abort_speed = value,
            "cruise_speed" => self.cruise_speed = value,
            "brake_rate" => self.brake_rate = value,
            "throttle_increase_rate" => self.throttle_increase_rate = value,
            "throttle_decrease_rate" => self.throttle_decrease_rate = value,
            "simulation_time_step" => self.simulation_time_step = value,
            "zero_velocity_threshold" => self.zero_velocity_threshold = value,
            other => log::warn!("[config] unknown key ignored: {other}"),
        }
    }
}
