//! Scenario event definitions.
//!
//! A scenario is a declarative table of [`EventDefinition`]s: a pure
//! predicate over the shared state plus an ordered list of controller
//! actions. Edge-trigger semantics (fire at most once per run) are
//! enforced by the event monitor and the controller manager, not here.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::action::ControllerAction;
use crate::state::SharedState;

/// Payload attached to a published event. Monitor-published events carry
/// [`EventPayload::Empty`]; other publishers may attach a scalar or text.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EventPayload {
    /// No payload.
    #[default]
    Empty,
    /// A scalar payload (e.g. a target pitch angle).
    Scalar(f64),
    /// A text payload.
    Text(String),
}

/// Predicate evaluated against the shared state each tick.
pub type EventPredicate = Arc<dyn Fn(&SharedState) -> bool + Send + Sync>;

/// One scenario event: name, trigger predicate, and response actions.
#[derive(Clone)]
pub struct EventDefinition {
    /// Event name, also the bus topic it is published under.
    pub name: String,
    /// Human-readable description of the trigger.
    pub description: String,
    /// Pure trigger predicate. Must be monotone-safe: once true it is
    /// latched, so flickering back to false has no effect.
    pub predicate: EventPredicate,
    /// Actions executed, in order, when the event fires.
    pub actions: SmallVec<[ControllerAction; 4]>,
    /// Fire at most once per run. All shipped scenarios set this.
    pub once: bool,
}

impl EventDefinition {
    /// Build a once-latched event definition.
    pub fn new<P>(
        name: impl Into<String>,
        description: impl Into<String>,
        predicate: P,
        actions: impl IntoIterator<Item = ControllerAction>,
    ) -> Self
    where
        P: Fn(&SharedState) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            predicate: Arc::new(predicate),
            actions: actions.into_iter().collect(),
            once: true,
        }
    }
}

impl fmt::Debug for EventDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("actions", &self.actions)
            .field("once", &self.once)
            .finish_non_exhaustive()
    }
}

/// Event name to definition, insertion-ordered so per-tick evaluation is
/// deterministic.
pub type EventTable = IndexMap<String, EventDefinition>;

/// Build an [`EventTable`] from definitions, keyed by event name.
pub fn table_from(defs: impl IntoIterator<Item = EventDefinition>) -> EventTable {
    defs.into_iter().map(|d| (d.name.clone(), d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_evaluates_predicate() {
        let def = EventDefinition::new(
            "START_THROTTLE",
            "throttle up after one second",
            |state: &SharedState| state.simulation_time.load() >= 1.0,
            [ControllerAction::StartThrottleIncrease],
        );
        let state = SharedState::default();
        assert!(!(def.predicate)(&state));
        state.simulation_time.store(1.5);
        assert!((def.predicate)(&state));
    }

    #[test]
    fn table_preserves_insertion_order() {
        let table = table_from([
            EventDefinition::new("B", "", |_: &SharedState| false, []),
            EventDefinition::new("A", "", |_: &SharedState| false, []),
        ]);
        let names: Vec<_> = table.keys().cloned().collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn definitions_default_to_once() {
        let def = EventDefinition::new("X", "", |_: &SharedState| true, []);
        assert!(def.once);
    }
}
