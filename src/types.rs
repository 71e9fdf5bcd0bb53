//! Core data types for serialscope
//!
//! This module contains the fundamental data structures shared across the
//! crate: connection state, signal direction, time-series points, and link
//! statistics.
//!
//! # Timestamps
//!
//! Two distinct time anchors exist by design and are never unified:
//!
//! - Store points carry seconds elapsed since the [`crate::store::TelemetryStore`]
//!   was created (monotonic, via `Instant`).
//! - CSV log rows carry seconds elapsed since the logging *session* started,
//!   so a replayed file is self-contained regardless of when during a run
//!   the session began.

use serde::{Deserialize, Serialize};

/// State of the device link
///
/// Owned by the [`crate::link::LinkManager`]; `Connecting` and `Closing` are
/// transient states visible to health indicators while an open or a
/// cooperative shutdown is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No device attached
    #[default]
    Idle,
    /// An open attempt is in progress
    Connecting,
    /// Link is up and the reader loop is running
    Open,
    /// A disconnect is in progress, waiting for the reader loop to finish
    Closing,
}

impl ConnectionState {
    /// Whether the link is fully established
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closing => write!(f, "closing"),
        }
    }
}

/// Direction of a signal relative to the host
///
/// Serialized as the `"RX"`/`"TX"` strings used by the signal database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalDirection {
    /// Device-to-host: the device reports this value
    #[serde(rename = "RX")]
    Rx,
    /// Host-to-device: the host writes this value
    #[serde(rename = "TX")]
    Tx,
}

impl std::fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDirection::Rx => write!(f, "RX"),
            SignalDirection::Tx => write!(f, "TX"),
        }
    }
}

/// A single recorded value with its store-relative timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    /// The raw value, passed through unchanged from the wire
    pub value: f64,
    /// Seconds elapsed since the owning store was created
    pub elapsed: f64,
}

impl DataPoint {
    /// Create a new data point
    pub fn new(value: f64, elapsed: f64) -> Self {
        Self { value, elapsed }
    }
}

/// Aggregate counters for the ingest path
///
/// Malformed lines are discarded silently by design; this is the only place
/// they are observable. Counters reset when a new link is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Signal lines successfully parsed and dispatched
    pub signals: u64,
    /// Heartbeat lines received
    pub heartbeats: u64,
    /// Non-empty lines discarded as malformed or out of format
    pub discarded: u64,
}

impl LinkStats {
    /// Total non-empty lines seen on the link
    pub fn total_lines(&self) -> u64 {
        self.signals + self.heartbeats + self.discarded
    }
}
