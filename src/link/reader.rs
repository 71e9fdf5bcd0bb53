//! Reader loop: the link's dedicated ingest thread
//!
//! Runs only while the transport is open. Each iteration polls for pending
//! bytes, frames them into lines, classifies each line, and forwards signal
//! events to the dispatch hub. The transport lock is released before any
//! dispatch so subscriber callbacks never run under it.
//!
//! A transport error is fatal for the session: the loop closes the
//! transport, flips the connection state back to idle, emits a fault event,
//! and terminates. It never reconnects on its own — that decision belongs to
//! the user. Cooperative shutdown is the inverse: the manager clears the run
//! flag and joins this thread *before* closing the transport, so an
//! in-flight iteration can never touch a closing handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crossbeam_channel::Sender;

use crate::error::ScopeError;
use crate::protocol::{LineCodec, LineEvent, LineFramer};
use crate::transport::Transport;
use crate::types::ConnectionState;

use super::{LinkEvent, LinkShared};

/// How long to idle when the transport has nothing pending
const IDLE_SLEEP: Duration = Duration::from_millis(5);

/// Wall-clock seconds since the Unix epoch, the receipt-timestamp base
fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// The ingest loop state, owned by the reader thread
pub(crate) struct ReaderLoop {
    shared: Arc<LinkShared>,
    running: Arc<AtomicBool>,
    event_tx: Sender<LinkEvent>,
    codec: LineCodec,
    framer: LineFramer,
}

impl ReaderLoop {
    pub(crate) fn new(
        shared: Arc<LinkShared>,
        running: Arc<AtomicBool>,
        event_tx: Sender<LinkEvent>,
    ) -> Self {
        Self {
            shared,
            running,
            event_tx,
            codec: LineCodec::new(),
            framer: LineFramer::new(),
        }
    }

    /// Run until stopped or until the transport fails
    pub(crate) fn run(mut self) {
        tracing::debug!("Reader loop started");

        while self.running.load(Ordering::SeqCst) {
            let chunk = self.shared.lock_transport().read_available();

            match chunk {
                Ok(bytes) if bytes.is_empty() => std::thread::sleep(IDLE_SLEEP),
                Ok(bytes) => self.process_chunk(&bytes),
                Err(err) => {
                    self.fail(err);
                    return;
                }
            }
        }

        tracing::debug!("Reader loop stopped");
    }

    /// Frame a chunk and classify every completed line
    fn process_chunk(&mut self, bytes: &[u8]) {
        for line in self.framer.push(bytes) {
            match self.codec.classify(&line) {
                Some(LineEvent::Heartbeat) => {
                    self.shared.set_last_heartbeat(Instant::now());
                    self.shared.bump_stats(|stats| stats.heartbeats += 1);
                }
                Some(LineEvent::Signal { key, value }) => {
                    let timestamp = epoch_seconds();
                    self.shared.bump_stats(|stats| stats.signals += 1);
                    self.shared.hub.dispatch(&key, value, timestamp);
                }
                None => {
                    if !line.trim().is_empty() {
                        self.shared.bump_stats(|stats| stats.discarded += 1);
                    }
                }
            }
        }
    }

    /// Fatal transport error: force disconnect and terminate
    fn fail(&self, err: ScopeError) {
        tracing::error!("Transport failure, closing link: {err}");

        if let Err(close_err) = self.shared.lock_transport().close() {
            tracing::warn!("Error while closing failed transport: {close_err}");
        }

        self.shared.set_state(ConnectionState::Idle);
        self.running.store(false, Ordering::SeqCst);
        let _ = self.event_tx.send(LinkEvent::Fault(err.to_string()));
    }
}
