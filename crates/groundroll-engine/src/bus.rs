//! Asynchronous event bus: bounded FIFO drained by a small worker pool.
//!
//! Subscription and publication take the registry lock only briefly;
//! callbacks always run outside the lock, so a callback may re-publish
//! without deadlocking. Overflow drops the newest event and counts it.
//! A panicking callback is caught and logged; the worker carries on.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use indexmap::IndexMap;

use groundroll_core::EventPayload;

/// Number of worker threads draining the bus queue.
const WORKER_COUNT: usize = 4;
/// Queue capacity; publishing beyond it drops the new event.
const QUEUE_CAPACITY: usize = 1000;

/// Boxed subscriber callback.
pub type EventCallback = Arc<dyn Fn(&EventPayload) + Send + Sync>;

/// Per-event delivery counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventStats {
    /// Publications attempted.
    pub total: u64,
    /// Callback invocations that ran to completion.
    pub processed: u64,
    /// Publications dropped on queue overflow.
    pub dropped: u64,
    /// Deliveries abandoned on timeout. Reserved; the shipped bus never
    /// times out a delivery.
    pub timeout: u64,
}

struct EventItem {
    event: String,
    payload: EventPayload,
}

/// Subscriber table and statistics, guarded by one mutex.
#[derive(Default)]
struct Registry {
    subscribers: HashMap<String, Vec<EventCallback>>,
    stats: IndexMap<String, EventStats>,
}

struct BusShared {
    registry: Mutex<Registry>,
    running: AtomicBool,
}

/// The event bus.
///
/// Dropping the bus shuts it down: pending items are still delivered
/// (the queue drains before the workers observe disconnection), the
/// workers are joined, and the statistics table is logged.
pub struct EventBus {
    shared: Arc<BusShared>,
    tx: Mutex<Option<Sender<EventItem>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create the bus and start its worker pool.
    pub fn new() -> Self {
        let shared = Arc::new(BusShared {
            registry: Mutex::new(Registry::default()),
            running: AtomicBool::new(true),
        });
        let (tx, rx) = crossbeam_channel::bounded(QUEUE_CAPACITY);

        let workers = (0..WORKER_COUNT)
            .map(|i| {
                let shared = Arc::clone(&shared);
                let rx: Receiver<EventItem> = rx.clone();
                thread::Builder::new()
                    .name(format!("event-bus-{i}"))
                    .spawn(move || worker_loop(shared, rx))
                    .expect("spawn event-bus worker")
            })
            .collect();

        log::debug!("[bus] started with {WORKER_COUNT} workers, capacity {QUEUE_CAPACITY}");
        Self {
            shared,
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
        }
    }

    /// Subscribe `callback` to `event`.
    pub fn subscribe<F>(&self, event: &str, callback: F)
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        let mut registry = self.shared.registry.lock().unwrap();
        registry
            .subscribers
            .entry(event.to_string())
            .or_default()
            .push(Arc::new(callback));
        registry.stats.entry(event.to_string()).or_default();
        log::debug!("[bus] subscribed to event: {event}");
    }

    /// Publish `event` with `payload`.
    ///
    /// Non-blocking: if the queue is at capacity the event is dropped
    /// and counted in [`EventStats::dropped`].
    pub fn publish(&self, event: &str, payload: EventPayload) {
        if !self.shared.running.load(Ordering::Acquire) {
            return;
        }
        {
            let mut registry = self.shared.registry.lock().unwrap();
            registry.stats.entry(event.to_string()).or_default().total += 1;
        }

        let tx = self.tx.lock().unwrap();
        let Some(tx) = tx.as_ref() else { return };
        match tx.try_send(EventItem {
            event: event.to_string(),
            payload,
        }) {
            Ok(()) => log::debug!("[bus] published event: {event}"),
            Err(TrySendError::Full(item)) => {
                let mut registry = self.shared.registry.lock().unwrap();
                registry.stats.entry(item.event.clone()).or_default().dropped += 1;
                log::warn!("[bus] queue full, dropped event: {}", item.event);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Whether at least one callback for `event` has completed.
    pub fn is_event_triggered(&self, event: &str) -> bool {
        let registry = self.shared.registry.lock().unwrap();
        registry.stats.get(event).is_some_and(|s| s.processed > 0)
    }

    /// Delivery counters for `event`, if it has ever been seen.
    pub fn stats(&self, event: &str) -> Option<EventStats> {
        let registry = self.shared.registry.lock().unwrap();
        registry.stats.get(event).copied()
    }

    /// Drop all subscriptions and statistics.
    pub fn clear(&self) {
        let mut registry = self.shared.registry.lock().unwrap();
        registry.subscribers.clear();
        registry.stats.clear();
    }

    /// Stop the worker pool after the queue drains, then log statistics.
    ///
    /// Idempotent; also invoked by `Drop`.
    pub fn shutdown(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        // Dropping the sender lets workers drain the queue, then exit.
        self.tx.lock().unwrap().take();
        let workers: Vec<_> = self.workers.lock().unwrap().drain(..).collect();
        for worker in workers {
            let _ = worker.join();
        }
        self.log_stats();
        log::debug!("[bus] shut down");
    }

    fn log_stats(&self) {
        let registry = self.shared.registry.lock().unwrap();
        for (event, stats) in &registry.stats {
            log::debug!(
                "[bus] event {event}: total={} processed={} dropped={} timeout={}",
                stats.total,
                stats.processed,
                stats.dropped,
                stats.timeout,
            );
        }
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: Arc<BusShared>, rx: Receiver<EventItem>) {
    // recv() fails only once the queue is empty and the sender dropped,
    // so pending items survive shutdown.
    while let Ok(item) = rx.recv() {
        let callbacks: Vec<EventCallback> = {
            let registry = shared.registry.lock().unwrap();
            match registry.subscribers.get(&item.event) {
                Some(list) => list.clone(),
                None => {
                    log::warn!("[bus] event {} has no subscribers", item.event);
                    continue;
                }
            }
        };

        log::debug!("[bus] processing event: {}", item.event);
        for callback in callbacks {
            // Callbacks run outside the registry lock and may re-publish.
            let outcome = catch_unwind(AssertUnwindSafe(|| callback(&item.payload)));
            match outcome {
                Ok(()) => {
                    let mut registry = shared.registry.lock().unwrap();
                    registry.stats.entry(item.event.clone()).or_default().processed += 1;
                }
                Err(_) => {
                    log::warn!("[bus] callback for event {} panicked", item.event);
                }
            }
        }
    }
    log::debug!("[bus] worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn wait_until(deadline_ms: u64, mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(deadline_ms);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        done()
    }

    #[test]
    fn publish_reaches_subscriber() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            bus.subscribe("LIFTOFF", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.publish("LIFTOFF", EventPayload::Empty);
        assert!(wait_until(1000, || hits.load(Ordering::SeqCst) == 1));
        assert!(bus.is_event_triggered("LIFTOFF"));
    }

    #[test]
    fn payload_is_delivered() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            bus.subscribe("SET_PITCH", move |payload| {
                *seen.lock().unwrap() = Some(payload.clone());
            });
        }
        bus.publish("SET_PITCH", EventPayload::Scalar(0.12));
        assert!(wait_until(1000, || seen.lock().unwrap().is_some()));
        assert_eq!(*seen.lock().unwrap(), Some(EventPayload::Scalar(0.12)));
    }

    #[test]
    fn unsubscribed_event_is_not_triggered() {
        let bus = EventBus::new();
        bus.publish("NOBODY_HOME", EventPayload::Empty);
        thread::sleep(Duration::from_millis(50));
        assert!(!bus.is_event_triggered("NOBODY_HOME"));
        // The publication was still counted.
        assert_eq!(bus.stats("NOBODY_HOME").unwrap().total, 1);
    }

    #[test]
    fn callback_panic_does_not_kill_the_pool() {
        let bus = EventBus::new();
        bus.subscribe("BOOM", |_| panic!("callback exploded"));
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            bus.subscribe("OK", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.publish("BOOM", EventPayload::Empty);
        bus.publish("OK", EventPayload::Empty);
        assert!(wait_until(1000, || hits.load(Ordering::SeqCst) == 1));
        // The panicked delivery never counts as processed.
        assert!(!bus.is_event_triggered("BOOM"));
    }

    #[test]
    fn callback_may_republish() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let bus2 = Arc::clone(&bus);
            bus.subscribe("FIRST", move |_| {
                bus2.publish("SECOND", EventPayload::Empty);
            });
        }
        {
            let hits = Arc::clone(&hits);
            bus.subscribe("SECOND", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.publish("FIRST", EventPayload::Empty);
        assert!(wait_until(1000, || hits.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn stats_count_total_and_processed() {
        let bus = EventBus::new();
        bus.subscribe("TICK", |_| {});
        for _ in 0..5 {
            bus.publish("TICK", EventPayload::Empty);
        }
        assert!(wait_until(1000, || {
            bus.stats("TICK").unwrap().processed == 5
        }));
        let stats = bus.stats("TICK").unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.dropped, 0);
    }

    #[test]
    fn clear_drops_subscriptions() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            bus.subscribe("GONE", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        bus.clear();
        bus.publish("GONE", EventPayload::Empty);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn shutdown_delivers_pending_items() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let hits = Arc::clone(&hits);
            bus.subscribe("LAST_WORDS", move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        for _ in 0..20 {
            bus.publish("LAST_WORDS", EventPayload::Empty);
        }
        bus.shutdown();
        assert_eq!(hits.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let bus = EventBus::new();
        bus.shutdown();
        bus.shutdown();
    }

    #[test]
    fn publish_after_shutdown_is_ignored() {
        let bus = EventBus::new();
        bus.shutdown();
        bus.publish("TOO_LATE", EventPayload::Empty);
        assert!(bus.stats("TOO_LATE").is_none());
    }
}
