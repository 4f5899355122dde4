//! Multi-producer/single-consumer queue of state updates.
//!
//! Controllers and the dynamics integrator enqueue writes during tick N;
//! the state manager drains them during the same tick. Both ends are
//! non-blocking: `push` never waits and `try_pop` returns immediately.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use groundroll_core::StateUpdate;

/// Handle to the shared state-update queue. Cloning yields another
/// handle onto the same queue.
#[derive(Clone)]
pub struct StateUpdateQueue {
    tx: Sender<StateUpdate>,
    rx: Receiver<StateUpdate>,
}

impl Default for StateUpdateQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl StateUpdateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Enqueue an update without blocking.
    pub fn push(&self, message: StateUpdate) {
        // The queue only disconnects at shutdown; a producer racing that
        // boundary loses its write, which the tick contract allows.
        if self.tx.send(message).is_err() {
            log::debug!("[queue] update dropped after shutdown: {message:?}");
        }
    }

    /// Dequeue one pending update without blocking.
    pub fn try_pop(&self) -> Option<StateUpdate> {
        match self.rx.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of pending updates.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue holds no pending updates.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
