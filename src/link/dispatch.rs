//! Fan-out of parsed data events to registered subscribers
//!
//! The hub decouples consumers (store feeder, displays, loggers) from the
//! reader loop: subscribers register a callback and receive every signal
//! event in registration order. A failing subscriber is isolated — its panic
//! is caught and logged, and the remaining subscribers still run.
//!
//! Dispatch happens synchronously on the reader thread, so callbacks must
//! not block at length or they stall ingestion. The subscriber list is
//! snapshotted before invoking anything, which keeps the lock from ever
//! spanning a callback and lets a subscriber unsubscribe itself mid-event.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A registered data callback: `(key, value, receipt_timestamp)`
///
/// The timestamp is wall-clock seconds since the Unix epoch, captured when
/// the line parsed.
pub type Subscriber = Arc<dyn Fn(&str, f64, f64) + Send + Sync>;

/// Thread-safe subscriber registry and dispatcher
#[derive(Default)]
pub struct DispatchHub {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl DispatchHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback
    ///
    /// Idempotent by `Arc` identity: re-registering the same handle has no
    /// additional effect.
    pub fn subscribe(&self, callback: Subscriber) {
        let mut subs = self.lock();
        if subs.iter().any(|existing| Arc::ptr_eq(existing, &callback)) {
            return;
        }
        subs.push(callback);
    }

    /// Remove a callback by `Arc` identity; a no-op when not registered
    pub fn unsubscribe(&self, callback: &Subscriber) {
        self.lock()
            .retain(|existing| !Arc::ptr_eq(existing, callback));
    }

    /// Number of registered subscribers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no subscribers are registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver one event to every subscriber in registration order
    ///
    /// A panicking subscriber is logged and skipped; it does not affect the
    /// others or the caller.
    pub fn dispatch(&self, key: &str, value: f64, timestamp: f64) {
        let snapshot: Vec<Subscriber> = self.lock().clone();

        for subscriber in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| subscriber(key, value, timestamp)));
            if result.is_err() {
                tracing::error!("Data subscriber panicked on {key}={value}; continuing");
            }
        }
    }
}
