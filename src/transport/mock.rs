//! Mock transport for testing and hardware-free demos
//!
//! Simulates a device byte stream: tests script incoming chunks, capture
//! outgoing writes, and inject read/write failures. The struct is a cheap
//! clone over shared state, so a test can keep a handle after moving the
//! transport into a [`crate::link::LinkManager`].
//!
//! # Example
//!
//! ```
//! use serialscope::transport::{MockTransport, Transport};
//!
//! let mut transport = MockTransport::new();
//! let handle = transport.clone();
//!
//! transport.open("mock0").unwrap();
//! handle.push_incoming(b"TEMP:25.31\r\n".to_vec());
//!
//! let bytes = transport.read_available().unwrap();
//! assert_eq!(bytes, b"TEMP:25.31\r\n");
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{Result, ScopeError};

use super::Transport;

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    /// Scripted incoming data; one chunk is returned per `read_available`
    /// call, mimicking how serial data arrives in bursts
    incoming: VecDeque<Vec<u8>>,
    /// Everything written by the host, in order
    written: Vec<u8>,
    fail_open: bool,
    fail_reads: bool,
    fail_writes: bool,
    /// Number of times the device was opened, for lifecycle assertions
    open_count: u32,
}

/// Scriptable in-memory [`Transport`]
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a closed mock device
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a chunk of incoming bytes for a future `read_available`
    pub fn push_incoming(&self, chunk: Vec<u8>) {
        self.lock().incoming.push_back(chunk);
    }

    /// Everything the host has written so far
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Whether any scripted chunks remain undelivered
    pub fn incoming_is_drained(&self) -> bool {
        self.lock().incoming.is_empty()
    }

    /// Make subsequent `open` calls fail
    pub fn set_fail_open(&self, fail: bool) {
        self.lock().fail_open = fail;
    }

    /// Make subsequent reads fail (simulates a yanked cable)
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Whether the device is open, readable from any handle
    pub fn is_open_now(&self) -> bool {
        self.lock().open
    }

    /// How many times the device has been opened
    pub fn open_count(&self) -> u32 {
        self.lock().open_count
    }
}

impl Transport for MockTransport {
    fn open(&mut self, _selector: &str) -> Result<()> {
        let mut state = self.lock();
        if state.open {
            return Ok(());
        }
        if state.fail_open {
            return Err(ScopeError::Transport("mock open failure".to_string()));
        }
        state.open = true;
        state.open_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.lock().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.lock().open
    }

    fn read_available(&mut self) -> Result<Vec<u8>> {
        let mut state = self.lock();
        if !state.open {
            return Err(ScopeError::NotConnected);
        }
        if state.fail_reads {
            return Err(ScopeError::Transport("mock read failure".to_string()));
        }
        Ok(state.incoming.pop_front().unwrap_or_default())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if !state.open {
            return Err(ScopeError::NotConnected);
        }
        if state.fail_writes {
            return Err(ScopeError::Transport("mock write failure".to_string()));
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_close_lifecycle() {
        let mut transport = MockTransport::new();
        assert!(!transport.is_open());

        transport.open("mock0").unwrap();
        assert!(transport.is_open());

        // Reopening while open is a no-op
        transport.open("mock0").unwrap();
        assert_eq!(transport.open_count(), 1);

        transport.close().unwrap();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_scripted_chunks_deliver_in_order() {
        let mut transport = MockTransport::new();
        transport.open("mock0").unwrap();

        transport.push_incoming(b"first".to_vec());
        transport.push_incoming(b"second".to_vec());

        assert_eq!(transport.read_available().unwrap(), b"first");
        assert_eq!(transport.read_available().unwrap(), b"second");
        assert!(transport.read_available().unwrap().is_empty());
    }

    #[test]
    fn test_writes_are_captured() {
        let mut transport = MockTransport::new();
        transport.open("mock0").unwrap();
        transport.write_all(b"SETP:1.50\r\n").unwrap();
        assert_eq!(transport.written(), b"SETP:1.50\r\n");
    }

    #[test]
    fn test_injected_failures() {
        let mut transport = MockTransport::new();
        transport.set_fail_open(true);
        assert!(transport.open("mock0").is_err());

        transport.set_fail_open(false);
        transport.open("mock0").unwrap();

        transport.set_fail_reads(true);
        assert!(transport.read_available().is_err());

        transport.set_fail_writes(true);
        assert!(transport.write_all(b"x").is_err());
    }

    #[test]
    fn test_io_requires_open() {
        let mut transport = MockTransport::new();
        assert!(matches!(
            transport.read_available(),
            Err(ScopeError::NotConnected)
        ));
        assert!(matches!(
            transport.write_all(b"x"),
            Err(ScopeError::NotConnected)
        ));
    }

    #[test]
    fn test_clone_shares_state() {
        let mut transport = MockTransport::new();
        let handle = transport.clone();

        transport.open("mock0").unwrap();
        assert!(handle.is_open_now());

        handle.push_incoming(b"data".to_vec());
        assert_eq!(transport.read_available().unwrap(), b"data");
        assert!(handle.incoming_is_drained());
    }
}
