//! Device link management
//!
//! This module owns the connection lifecycle around a [`Transport`]: a
//! dedicated reader thread ingests the line protocol while the control
//! context (the UI-equivalent driver) issues connect/disconnect/send calls
//! and queries. The two sides communicate through shared, mutex-guarded
//! state and a crossbeam event channel.
//!
//! # Architecture
//!
//! - [`LinkManager`] — control-side handle: connect, disconnect, send,
//!   subscribe, health queries
//! - [`ReaderLoop`](reader) — ingest thread: poll → frame → classify →
//!   dispatch
//! - [`DispatchHub`] — fan-out of parsed signal events to subscribers
//! - [`LinkEvent`] — discrete lifecycle/fault notifications for the shell
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serialscope::link::LinkManager;
//! use serialscope::store::TelemetryStore;
//! use serialscope::transport::MockTransport;
//!
//! let transport = MockTransport::new();
//! let device = transport.clone();
//! let (mut link, _events) = LinkManager::new(Box::new(transport));
//!
//! let store = Arc::new(TelemetryStore::default());
//! let feeder = store.clone();
//! link.subscribe(Arc::new(move |key, value, _ts| {
//!     feeder.append(key, value);
//! }));
//!
//! link.connect("mock0").unwrap();
//! device.push_incoming(b"TEMP:25.31\r\n".to_vec());
//! # while store.latest("TEMP").is_none() {
//! #     std::thread::sleep(std::time::Duration::from_millis(1));
//! # }
//! link.disconnect().unwrap();
//! assert_eq!(store.latest("TEMP"), Some(25.31));
//! ```

pub mod dispatch;
pub(crate) mod reader;

pub use dispatch::{DispatchHub, Subscriber};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error::{Result, ScopeError};
use crate::protocol::LineCodec;
use crate::transport::Transport;
use crate::types::{ConnectionState, LinkStats};

use reader::ReaderLoop;

/// Discrete link notifications for the shell
///
/// Parse discards never appear here — they are silent by design and only
/// visible in [`LinkStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link was opened and the reader loop is running
    Opened,
    /// The link was closed by user request
    Closed,
    /// The link died on a transport error and was force-closed
    Fault(String),
}

/// State shared between the control side and the reader thread
///
/// Each field has its own lock, held only across the individual mutation.
pub(crate) struct LinkShared {
    transport: Mutex<Box<dyn Transport>>,
    state: Mutex<ConnectionState>,
    last_heartbeat: Mutex<Option<Instant>>,
    stats: Mutex<LinkStats>,
    pub(crate) hub: DispatchHub,
}

impl LinkShared {
    fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Mutex::new(transport),
            state: Mutex::new(ConnectionState::Idle),
            last_heartbeat: Mutex::new(None),
            stats: Mutex::new(LinkStats::default()),
            hub: DispatchHub::new(),
        }
    }

    pub(crate) fn lock_transport(&self) -> MutexGuard<'_, Box<dyn Transport>> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    pub(crate) fn last_heartbeat(&self) -> Option<Instant> {
        *self
            .last_heartbeat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_last_heartbeat(&self, at: Instant) {
        *self
            .last_heartbeat
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    pub(crate) fn stats(&self) -> LinkStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn bump_stats(&self, update: impl FnOnce(&mut LinkStats)) {
        update(&mut self.stats.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Control-side handle for the device link
///
/// Owned by the consumer/control context. The reader thread only ever holds
/// the shared state, so dropping the manager also winds the thread down.
pub struct LinkManager {
    shared: Arc<LinkShared>,
    running: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    event_tx: Sender<LinkEvent>,
}

impl LinkManager {
    /// Create a manager around a transport, returning the link event receiver
    pub fn new(transport: Box<dyn Transport>) -> (Self, Receiver<LinkEvent>) {
        let (event_tx, event_rx) = unbounded();
        let manager = Self {
            shared: Arc::new(LinkShared::new(transport)),
            running: Arc::new(AtomicBool::new(false)),
            reader: None,
            event_tx,
        };
        (manager, event_rx)
    }

    /// Open the transport and start the reader loop
    ///
    /// Connecting while already open is a no-op success. On failure the
    /// state returns to idle and the error surfaces to the caller.
    pub fn connect(&mut self, selector: &str) -> Result<()> {
        if self.shared.state().is_open() {
            return Ok(());
        }

        self.shared.set_state(ConnectionState::Connecting);

        if let Err(err) = self.shared.lock_transport().open(selector) {
            self.shared.set_state(ConnectionState::Idle);
            return Err(err);
        }

        // A fresh link counts as alive until the first heartbeat window
        // passes, matching how health indicators grade it
        self.shared.set_last_heartbeat(Instant::now());
        self.shared.bump_stats(|stats| *stats = LinkStats::default());
        self.shared.set_state(ConnectionState::Open);

        self.running.store(true, Ordering::SeqCst);
        let reader = ReaderLoop::new(
            self.shared.clone(),
            self.running.clone(),
            self.event_tx.clone(),
        );
        self.reader = Some(std::thread::spawn(move || reader.run()));

        tracing::info!("Link opened on {selector}");
        let _ = self.event_tx.send(LinkEvent::Opened);
        Ok(())
    }

    /// Stop the reader loop and close the transport
    ///
    /// Cooperative: waits for the in-flight reader iteration to finish
    /// before the transport is closed, so nothing reads a closing handle.
    /// Disconnecting while idle is a no-op success.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.shared.state() == ConnectionState::Idle && self.reader.is_none() {
            return Ok(());
        }

        self.shared.set_state(ConnectionState::Closing);
        self.join_reader();

        let close_result = self.shared.lock_transport().close();
        self.shared.set_state(ConnectionState::Idle);

        tracing::info!("Link closed");
        let _ = self.event_tx.send(LinkEvent::Closed);
        close_result
    }

    /// Toggle between connected and disconnected, returning the new state
    pub fn toggle(&mut self, selector: &str) -> Result<ConnectionState> {
        if self.is_connected() {
            self.disconnect()?;
        } else {
            self.connect(selector)?;
        }
        Ok(self.state())
    }

    /// Whether the link is fully open
    pub fn is_connected(&self) -> bool {
        self.shared.state().is_open()
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Encode and write one key/value message to the device
    ///
    /// A write failure is fatal for the session: the link is force-closed
    /// and the error surfaces to the caller.
    pub fn send(&mut self, key: &str, value: f64) -> Result<()> {
        if !self.is_connected() {
            return Err(ScopeError::NotConnected);
        }

        let bytes = LineCodec::encode(key, value);
        let result = self.shared.lock_transport().write_all(&bytes);

        if let Err(err) = result {
            tracing::error!("Write failed, closing link: {err}");
            let _ = self.disconnect();
            return Err(err);
        }
        Ok(())
    }

    /// Register a data subscriber; idempotent by `Arc` identity
    pub fn subscribe(&self, callback: Subscriber) {
        self.shared.hub.subscribe(callback);
    }

    /// Remove a data subscriber; a no-op when not registered
    pub fn unsubscribe(&self, callback: &Subscriber) {
        self.shared.hub.unsubscribe(callback);
    }

    /// Seconds since the last heartbeat, `None` before the first connect
    ///
    /// Health indicators grade the link stale when this grows beyond the
    /// device's heartbeat interval.
    pub fn seconds_since_heartbeat(&self) -> Option<f64> {
        self.shared
            .last_heartbeat()
            .map(|at| at.elapsed().as_secs_f64())
    }

    /// Snapshot of the ingest counters for the current link session
    pub fn stats(&self) -> LinkStats {
        self.shared.stats()
    }

    /// Clear the run flag and wait for the reader thread to finish
    fn join_reader(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                tracing::error!("Reader thread panicked during shutdown");
            }
        }
    }
}

impl Drop for LinkManager {
    fn drop(&mut self) {
        self.join_reader();
        let _ = self.shared.lock_transport().close();
    }
}
