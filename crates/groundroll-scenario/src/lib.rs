//! Scenario layer for the groundroll flight-dynamics simulator.
//!
//! A scenario is a declarative bundle: numeric parameters parsed from a
//! `KEY = value` config file, an event table of predicates and action
//! lists, an initial-state seed, and an event-state hook. The
//! [`runner`] wires a scenario into the full kernel — clock, state
//! manager, bus, monitor, controller manager, dynamics, recorder — and
//! drives it to completion.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod abort;
pub mod actions;
pub mod config;
pub mod runner;
pub mod taxi;

pub use config::ScenarioConfig;
pub use runner::{run, RunReport, RunnerOptions, Scenario, ScenarioError};
