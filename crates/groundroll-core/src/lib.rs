//! Core types for the groundroll flight-dynamics simulator.
//!
//! This is the leaf crate with zero internal groundroll dependencies. It
//! defines the shared vehicle state, the state-update message protocol,
//! the controller-action wire enumeration, and scenario event definitions
//! used throughout the workspace.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod atomic;
pub mod error;
pub mod event;
pub mod state;
pub mod update;

// Re-export core types at crate root for convenience.
pub use action::{ActionConfig, ActionKind, ActionTable, ControllerAction};
pub use atomic::AtomicF64;
pub use error::InitError;
pub use event::{EventDefinition, EventPayload, EventTable};
pub use state::{FlightMode, SharedState, StateSnapshot};
pub use update::{StateUpdate, StateUpdateKind};
