//! Controller actions and the action-to-controller configuration map.
//!
//! [`ControllerAction`] is the wire contract shared with the action config
//! file: variant names appear verbatim as `ACTION_NAME` keys. The parsed
//! file becomes an [`ActionTable`] mapping action names to the controller
//! to operate and the state flags to set first.

use indexmap::IndexMap;

/// Sentinel controller name that marks a stop-everything action.
pub const STOP_ALL_NAME: &str = "STOP_ALL";
/// Sentinel controller name that marks a flight-mode switch action.
pub const MODE_NAME: &str = "MODE";

/// Scenario-level commands dispatched to the controller manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // variant names are the wire contract
pub enum ControllerAction {
    StartThrottleIncrease,
    StopThrottleIncrease,
    StartThrottleDecrease,
    StopThrottleDecrease,
    StartBrake,
    StopBrake,
    StartCruise,
    StopCruise,
    StartPitchControl,
    StopPitchControl,
    SetPitchAngle,
    StopAllControllers,
    SwitchToAutoMode,
    SwitchToManualMode,
    SwitchToSemiAutoMode,
}

impl ControllerAction {
    /// All actions, in wire order.
    pub const ALL: [ControllerAction; 15] = [
        Self::StartThrottleIncrease,
        Self::StopThrottleIncrease,
        Self::StartThrottleDecrease,
        Self::StopThrottleDecrease,
        Self::StartBrake,
        Self::StopBrake,
        Self::StartCruise,
        Self::StopCruise,
        Self::StartPitchControl,
        Self::StopPitchControl,
        Self::SetPitchAngle,
        Self::StopAllControllers,
        Self::SwitchToAutoMode,
        Self::SwitchToManualMode,
        Self::SwitchToSemiAutoMode,
    ];

    /// The wire name used in config files and event logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::StartThrottleIncrease => "START_THROTTLE_INCREASE",
            Self::StopThrottleIncrease => "STOP_THROTTLE_INCREASE",
            Self::StartThrottleDecrease => "START_THROTTLE_DECREASE",
            Self::StopThrottleDecrease => "STOP_THROTTLE_DECREASE",
            Self::StartBrake => "START_BRAKE",
            Self::StopBrake => "STOP_BRAKE",
            Self::StartCruise => "START_CRUISE",
            Self::StopCruise => "STOP_CRUISE",
            Self::StartPitchControl => "START_PITCH_CONTROL",
            Self::StopPitchControl => "STOP_PITCH_CONTROL",
            Self::SetPitchAngle => "SET_PITCH_ANGLE",
            Self::StopAllControllers => "STOP_ALL_CONTROLLERS",
            Self::SwitchToAutoMode => "SWITCH_TO_AUTO_MODE",
            Self::SwitchToManualMode => "SWITCH_TO_MANUAL_MODE",
            Self::SwitchToSemiAutoMode => "SWITCH_TO_SEMI_AUTO_MODE",
        }
    }

    /// Parse a wire name back into an action.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Whether this action starts a controller (name begins `START_`).
    pub fn is_start(self) -> bool {
        self.name().starts_with("START_")
    }

    /// Whether this action stops a controller (name begins `STOP_`).
    pub fn is_stop(self) -> bool {
        self.name().starts_with("STOP_") && self != Self::StopAllControllers
    }
}

impl std::fmt::Display for ControllerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the manager interprets a configured action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Operate the named controller (start/stop by action-name prefix).
    Controller,
    /// Stop every controller.
    StopAll,
    /// Switch flight mode (`flight_mode` state setting carries the mode).
    Mode,
}

impl ActionKind {
    /// Derive the kind from the configured controller name, per the
    /// config-file contract (`STOP_ALL` and `MODE` are sentinels).
    pub fn from_controller_name(name: &str) -> Self {
        match name {
            STOP_ALL_NAME => Self::StopAll,
            MODE_NAME => Self::Mode,
            _ => Self::Controller,
        }
    }
}

/// One entry of the action config: the controller to operate and the
/// state flags to apply before operating it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionConfig {
    /// Target controller name, or a sentinel (`STOP_ALL`, `MODE`).
    pub controller_name: String,
    /// `field_name -> literal` settings applied to the shared state
    /// before the controller operation. Insertion-ordered for faithful
    /// round trips.
    pub state_settings: IndexMap<String, String>,
    /// Interpretation of this entry.
    pub action_type: ActionKind,
}

impl ActionConfig {
    /// Build an entry, deriving the kind from the controller name.
    pub fn new(controller_name: impl Into<String>) -> Self {
        let controller_name = controller_name.into();
        let action_type = ActionKind::from_controller_name(&controller_name);
        Self {
            controller_name,
            state_settings: IndexMap::new(),
            action_type,
        }
    }

    /// Add a state setting, builder style.
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.state_settings.insert(key.into(), value.into());
        self
    }
}

/// Action name to configuration, insertion-ordered.
pub type ActionTable = IndexMap<String, ActionConfig>;
