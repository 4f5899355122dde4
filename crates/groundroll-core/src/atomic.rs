//! Lock-free `f64` cell built on `AtomicU64` bit transmutation.
//!
//! The shared vehicle state is a bag of scalar doubles written and read
//! concurrently by a dozen worker threads. [`AtomicF64`] gives each scalar
//! its own acquire/release cell without a lock on the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` with atomic load/store semantics.
///
/// Stores use `Release` ordering and loads use `Acquire`, so a scalar
/// written before a snapshot commit is visible to any reader that observes
/// the commit. NaN payloads round-trip bit-exactly.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    /// Create a cell holding `value`.
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Atomically load the current value (acquire).
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Atomically store `value` (release).
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

impl From<f64> for AtomicF64 {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_then_load_round_trips() {
        let cell = AtomicF64::new(3.25);
        assert_eq!(cell.load(), 3.25);
    }

    #[test]
    fn store_overwrites() {
        let cell = AtomicF64::new(0.0);
        cell.store(-17.5);
        assert_eq!(cell.load(), -17.5);
        cell.store(f64::INFINITY);
        assert_eq!(cell.load(), f64::INFINITY);
    }

    #[test]
    fn default_is_zero() {
        let cell = AtomicF64::default();
        assert_eq!(cell.load(), 0.0);
    }

    #[test]
    fn nan_round_trips_bitwise() {
        let cell = AtomicF64::new(f64::NAN);
        assert!(cell.load().is_nan());
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;

        let cell = Arc::new(AtomicF64::new(0.0));
        let writer = {
            let cell = Arc::clone(&cell);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    cell.store(f64::from(i));
                }
            })
        };
        // Concurrent loads must always observe a value some store produced.
        for _ in 0..1000 {
            let v = cell.load();
            assert!((0.0..1000.0).contains(&v));
        }
        writer.join().unwrap();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn store_load_round_trips(value in proptest::num::f64::ANY) {
                let cell = AtomicF64::new(0.0);
                cell.store(value);
                let read = cell.load();
                prop_assert_eq!(read.to_bits(), value.to_bits());
            }
        }
    }
}
