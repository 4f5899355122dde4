//! Action config file parsing and serialization.
//!
//! Format, one entry per line:
//!
//! ```text
//! ACTION_NAME = controller_name, key=value[;key=value]*
//! ```
//!
//! Controller name `STOP_ALL` marks a stop-everything action and `MODE`
//! a flight-mode switch; anything else operates the named controller.
//! A missing file yields the built-in defaults.

use std::fs;
use std::path::Path;

use groundroll_core::{ActionConfig, ActionTable, ControllerAction};

/// Load the action table from a file, falling back to the defaults.
pub fn load(path: &Path) -> ActionTable {
    match fs::read_to_string(path) {
        Ok(text) => parse_table(&text),
        Err(_) => {
            log::warn!(
                "[actions] {} not found, using built-in action config",
                path.display()
            );
            default_table()
        }
    }
}

/// Parse a whole config file. Malformed lines are warned and skipped.
pub fn parse_table(text: &str) -> ActionTable {
    let mut table = ActionTable::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_entry(line) {
            Some((name, config)) => {
                log::debug!("[actions] {name} -> {}", config.controller_name);
                table.insert(name, config);
            }
            None => log::warn!("[actions] line {}: malformed entry: {line}", index + 1),
        }
    }
    log::debug!("[actions] loaded {} action configs", table.len());
    table
}

/// Parse one `ACTION_NAME = controller, k=v;k=v` entry.
pub fn parse_entry(line: &str) -> Option<(String, ActionConfig)> {
    let (name, rest) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let rest = rest.trim();
    let (controller, settings) = match rest.split_once(',') {
        Some((controller, settings)) => (controller.trim(), settings.trim()),
        None => (rest, ""),
    };
    if controller.is_empty() {
        return None;
    }

    let mut config = ActionConfig::new(controller);
    for setting in settings.split(';').filter(|s| !s.trim().is_empty()) {
        let (key, value) = setting.split_once('=')?;
        config
            .state_settings
            .insert(key.trim().to_string(), value.trim().to_string());
    }
    Some((name.to_string(), config))
}

/// Serialize one entry back into the config-file format.
pub fn serialize_entry(name: &str, config: &ActionConfig) -> String {
    if config.state_settings.is_empty() {
        return format!("{name} = {}", config.controller_name);
    }
    let settings: Vec<String> = config
        .state_settings
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    format!("{name} = {}, {}", config.controller_name, settings.join(";"))
}

/// The built-in action table, matching the shipped controller roster.
pub fn default_table() -> ActionTable {
    let mut table = ActionTable::new();
    let mut add = |action: ControllerAction, config: ActionConfig| {
        table.insert(action.name().to_string(), config);
    };

    add(
        ControllerAction::StartThrottleIncrease,
        ActionConfig::new("throttle_inc").with_setting("throttle_control_enabled", "true"),
    );
    add(
        ControllerAction::StopThrottleIncrease,
        ActionConfig::new("throttle_inc").with_setting("throttle_control_enabled", "false"),
    );
    add(
        ControllerAction::StartThrottleDecrease,
        ActionConfig::new("throttle_dec").with_setting("throttle_control_enabled", "true"),
    );
    add(
        ControllerAction::StopThrottleDecrease,
        ActionConfig::new("throttle_dec").with_setting("throttle_control_enabled", "false"),
    );
    add(
        ControllerAction::StartBrake,
        ActionConfig::new("brake")
            .with_setting("cruise_control_enabled", "false")
            .with_setting("brake_control_enabled", "true"),
    );
    add(
        ControllerAction::StopBrake,
        ActionConfig::new("brake").with_setting("brake_control_enabled", "false"),
    );
    add(
        ControllerAction::StartCruise,
        ActionConfig::new("cruise_runway").with_setting("cruise_control_enabled", "true"),
    );
    add(
        ControllerAction::StopCruise,
        ActionConfig::new("cruise_runway").with_setting("cruise_control_enabled", "false"),
    );
    add(
        ControllerAction::StartPitchControl,
        ActionConfig::new("pitch_hold").with_setting("pitch_control_enabled", "true"),
    );
    add(
        ControllerAction::StopPitchControl,
        ActionConfig::new("pitch_hold").with_setting("pitch_control_enabled", "false"),
    );
    add(ControllerAction::SetPitchAngle, ActionConfig::new("pitch_hold"));
    add(ControllerAction::StopAllControllers, ActionConfig::new("STOP_ALL"));
    add(
        ControllerAction::SwitchToAutoMode,
        ActionConfig::new("MODE").with_setting("flight_mode", "AUTO"),
    );
    add(
        ControllerAction::SwitchToManualMode,
        ActionConfig::new("MODE").with_setting("flight_mode", "MANUAL"),
    );
    add(
        ControllerAction::SwitchToSemiAutoMode,
        ActionConfig::new("MODE").with_setting("flight_mode", "SEMI_AUTO"),
    );
    table
}
