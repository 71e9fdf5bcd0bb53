//! Transport abstraction for the device byte stream
//!
//! This module provides a common trait for byte-stream transports, enabling
//! both real serial ports and an in-memory mock for tests and demos.
//!
//! # Contract
//!
//! - [`Transport::read_available`] is non-blocking: it returns whatever bytes
//!   are pending, or an empty buffer when there is nothing to read. Blocking
//!   waits belong to the caller (the reader loop sleeps between polls).
//! - Any read/write error while open is fatal for the session; the reader
//!   loop reacts by closing the transport and halting.
//! - `open` while already open and `close` while already closed are no-op
//!   successes, so disconnect paths are idempotent.

pub mod mock;
pub mod serial;

pub use mock::MockTransport;
pub use serial::{list_ports, PortInfo, SerialTransport};

use crate::error::Result;

/// Unified interface for device byte streams
///
/// Implementations must be `Send` so the link can hand the transport to the
/// reader thread.
pub trait Transport: Send {
    /// Open the device named by `selector` (e.g. a serial port path)
    ///
    /// Opening while already open is a no-op success.
    fn open(&mut self, selector: &str) -> Result<()>;

    /// Close the device, releasing the handle
    ///
    /// Closing while already closed is a no-op success.
    fn close(&mut self) -> Result<()>;

    /// Whether the device is currently open
    fn is_open(&self) -> bool;

    /// Read all pending bytes without blocking
    ///
    /// Returns an empty buffer when nothing is pending. An `Err` is a
    /// link-level failure and ends the session.
    fn read_available(&mut self) -> Result<Vec<u8>>;

    /// Write the full buffer to the device
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}
