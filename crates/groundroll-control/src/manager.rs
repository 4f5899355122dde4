//! The controller manager: owns the controller roster and translates
//! scenario events into controller lifecycle operations.
//!
//! Event callbacks registered on the bus do no work themselves — they
//! enqueue the event name on the manager's dispatch queue, and the
//! manager's own worker executes the configured action list. The
//! first-invocation latch lives here, so a double-published event
//! executes its actions at most once per run.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexMap;

use groundroll_core::{
    ActionConfig, ActionKind, ActionTable, ControllerAction, EventTable, FlightMode, SharedState,
};
use groundroll_engine::bus::EventBus;
use groundroll_engine::clock::SimClock;
use groundroll_engine::queue::StateUpdateQueue;

use crate::brake::BrakeController;
use crate::controller::{Controller, ControllerRates};
use crate::cruise::CruiseController;
use crate::pitch::PitchHoldController;
use crate::throttle::{ThrottleDecrease, ThrottleIncrease};

/// Controllers whose start is gated on auto-throttle authority.
const THROTTLE_GATED: [&str; 3] = ["throttle_inc", "throttle_dec", "cruise_runway"];
/// Controllers whose start is gated on auto-brake authority.
const BRAKE_GATED: [&str; 1] = ["brake"];

enum Dispatch {
    Event(String),
    Shutdown,
}

/// Hook invoked after an event latches, before its actions execute.
pub type EventStateCallback = Box<dyn Fn(&str) + Send + Sync>;

struct ManagerShared {
    state: Arc<SharedState>,
    controllers: IndexMap<String, Arc<dyn Controller>>,
    actions: ActionTable,
    definitions: Mutex<EventTable>,
    triggered: Mutex<HashSet<String>>,
    event_callback: Mutex<Option<EventStateCallback>>,
}

/// Owns the fixed controller roster and the event-dispatch worker.
pub struct ControllerManager {
    shared: Arc<ManagerShared>,
    pitch: Arc<PitchHoldController>,
    dispatch_tx: Sender<Dispatch>,
    dispatch_rx: Receiver<Dispatch>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ControllerManager {
    /// Instantiate the roster and the dispatch queue.
    pub fn new(
        state: Arc<SharedState>,
        clock: Arc<SimClock>,
        queue: StateUpdateQueue,
        actions: ActionTable,
        rates: ControllerRates,
    ) -> Self {
        let pitch = Arc::new(PitchHoldController::new(
            Arc::clone(&state),
            Arc::clone(&clock),
        ));

        let mut controllers: IndexMap<String, Arc<dyn Controller>> = IndexMap::new();
        let roster: [Arc<dyn Controller>; 5] = [
            Arc::new(ThrottleIncrease::new(
                Arc::clone(&state),
                Arc::clone(&clock),
                queue.clone(),
                rates.throttle_increase_rate,
            )),
            Arc::new(ThrottleDecrease::new(
                Arc::clone(&state),
                Arc::clone(&clock),
                queue,
                rates.throttle_decrease_rate,
            )),
            Arc::new(BrakeController::new(
                Arc::clone(&state),
                Arc::clone(&clock),
                rates.brake_rate,
            )),
            Arc::new(CruiseController::new(
                Arc::clone(&state),
                Arc::clone(&clock),
                rates.cruise_gain,
            )),
            Arc::clone(&pitch) as Arc<dyn Controller>,
        ];
        for controller in roster {
            controllers.insert(controller.name().to_string(), controller);
        }
        log::debug!(
            "[manager] created controllers: {:?}",
            controllers.keys().collect::<Vec<_>>()
        );

        let (dispatch_tx, dispatch_rx) = crossbeam_channel::unbounded();
        Self {
            shared: Arc::new(ManagerShared {
                state,
                controllers,
                actions,
                definitions: Mutex::new(EventTable::new()),
                triggered: Mutex::new(HashSet::new()),
                event_callback: Mutex::new(None),
            }),
            pitch,
            dispatch_tx,
            dispatch_rx,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Store the scenario's event table.
    pub fn set_event_definitions(&self, definitions: EventTable) {
        *self.shared.definitions.lock().unwrap() = definitions;
    }

    /// Install the scenario's event-state-change hook. It runs on the
    /// dispatch worker after an event latches and before its actions.
    pub fn set_event_callback(&self, callback: EventStateCallback) {
        *self.shared.event_callback.lock().unwrap() = Some(callback);
    }

    /// Subscribe a dispatch callback for every event in the table.
    pub fn setup_event_handlers(&self, bus: &EventBus) {
        let definitions = self.shared.definitions.lock().unwrap();
        for name in definitions.keys() {
            let tx = self.dispatch_tx.clone();
            let event = name.clone();
            bus.subscribe(name, move |_| {
                let _ = tx.send(Dispatch::Event(event.clone()));
            });
        }
        log::debug!("[manager] handlers registered for {} events", definitions.len());
    }

    /// Enqueue an event for the dispatch worker directly, bypassing the
    /// bus. Used by tests and by in-process publishers.
    pub fn dispatch(&self, event: &str) {
        let _ = self.dispatch_tx.send(Dispatch::Event(event.to_string()));
    }

    /// Start the dispatch worker.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let rx = self.dispatch_rx.clone();
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("controller-manager".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    match rx.recv() {
                        Ok(Dispatch::Event(name)) => handle_event(&shared, &name),
                        Ok(Dispatch::Shutdown) | Err(_) => break,
                    }
                }
            })
            .expect("spawn controller-manager thread");
        *self.worker.lock().unwrap() = Some(handle);
        log::debug!("[manager] started");
    }

    /// Stop every controller, then the dispatch worker.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        for controller in self.shared.controllers.values() {
            controller.stop();
        }
        let _ = self.dispatch_tx.send(Dispatch::Shutdown);
        self.join();
        log::debug!("[manager] stopped");
    }

    /// Join the dispatch worker if it is still running.
    pub fn join(&self) {
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Whether this event's action list has already executed.
    pub fn is_event_triggered(&self, event: &str) -> bool {
        self.shared.triggered.lock().unwrap().contains(event)
    }

    /// Look up a controller by roster name.
    pub fn controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.shared.controllers.get(name).cloned()
    }

    /// The pitch controller, for gain/target tuning.
    pub fn pitch_hold(&self) -> &PitchHoldController {
        &self.pitch
    }
}

impl Drop for ControllerManager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_event(shared: &ManagerShared, event: &str) {
    {
        let mut triggered = shared.triggered.lock().unwrap();
        if !triggered.insert(event.to_string()) {
            log::debug!("[manager] event {event} already triggered, skipping");
            return;
        }
    }
    log::info!("[manager] handling event: {event}");

    {
        let callback = shared.event_callback.lock().unwrap();
        if let Some(callback) = callback.as_ref() {
            callback(event);
        }
    }

    let actions = {
        let definitions = shared.definitions.lock().unwrap();
        match definitions.get(event) {
            Some(definition) => definition.actions.clone(),
            None => {
                log::warn!("[manager] no definition for event: {event}");
                return;
            }
        }
    };

    for action in actions {
        execute_action(shared, action);
    }
    log_controller_status(shared);
}

fn execute_action(shared: &ManagerShared, action: ControllerAction) {
    let Some(config) = shared.actions.get(action.name()) else {
        log::warn!("[manager] no action config for: {action}");
        return;
    };

    match config.action_type {
        ActionKind::Controller => {
            apply_state_settings(&shared.state, config);
            if action.is_start() {
                start_controller(shared, &config.controller_name);
            } else if action.is_stop() {
                stop_controller(shared, &config.controller_name);
            }
        }
        ActionKind::StopAll => {
            for controller in shared.controllers.values() {
                controller.stop();
            }
            log::info!("[manager] all controllers stopped");
        }
        ActionKind::Mode => match config
            .state_settings
            .get("flight_mode")
            .and_then(|name| FlightMode::from_config_name(name))
        {
            Some(mode) => {
                shared.state.set_flight_mode(mode);
                log::info!("[manager] flight mode set to {mode}");
            }
            None => log::warn!("[manager] mode action {action} carries no valid flight_mode"),
        },
    }
    log::debug!("[manager] executed action {action} -> {}", config.controller_name);
}

fn apply_state_settings(state: &SharedState, config: &ActionConfig) {
    for (key, value) in &config.state_settings {
        let enabled = value == "true";
        match key.as_str() {
            "throttle_control_enabled" => {
                state.throttle_control_enabled.store(enabled, Ordering::Release)
            }
            "brake_control_enabled" => state.brake_control_enabled.store(enabled, Ordering::Release),
            "cruise_control_enabled" => {
                state.cruise_control_enabled.store(enabled, Ordering::Release)
            }
            "pitch_control_enabled" => state.pitch_control_enabled.store(enabled, Ordering::Release),
            other => log::warn!("[manager] unrecognized state setting: {other}"),
        }
    }
}

fn start_controller(shared: &ManagerShared, name: &str) {
    let Some(controller) = shared.controllers.get(name) else {
        log::warn!("[manager] controller not found: {name}");
        return;
    };

    if THROTTLE_GATED.contains(&name) && !shared.state.auto_has_throttle_control() {
        log::warn!("[manager] auto system lacks throttle authority, not starting {name}");
        return;
    }
    if BRAKE_GATED.contains(&name) && !shared.state.auto_has_brake_control() {
        log::warn!("[manager] auto system lacks brake authority, not starting {name}");
        return;
    }

    controller.start();
    log::info!("[manager] started controller: {name}");
}

fn stop_controller(shared: &ManagerShared, name: &str) {
    if let Some(controller) = shared.controllers.get(name) {
        controller.stop();
        log::info!("[manager] stopped controller: {name}");
    }
}

fn log_controller_status(shared: &ManagerShared) {
    for (name, controller) in &shared.controllers {
        if controller.is_enabled() {
            log::debug!("[manager] {name} current value: {:.2}", controller.current_value());
        }
    }
}
