//! Observation sinks for the groundroll flight-dynamics simulator.
//!
//! [`logging::DualSink`] implements the `log` facade over two files plus
//! a console mirror; [`recorder::CsvRecorder`] streams the per-tick
//! vehicle state as fixed-width CSV, with a clock-synchronized worker
//! ([`recorder::RecorderWorker`]) sampling one row per tick boundary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod logging;
pub mod recorder;

pub use logging::{DualSink, LogError};
pub use recorder::{CsvRecorder, RecorderError, RecorderWorker, StateRow};
