//! Error handling for serialscope
//!
//! This module defines the crate-wide error type and a `Result` alias used
//! throughout the library. Protocol-level violations (malformed telemetry
//! lines) are deliberately *not* errors — they are silently discarded by the
//! codec and only observable through [`crate::types::LinkStats`].

use thiserror::Error;

/// Main error type for serialscope operations
#[derive(Error, Debug)]
pub enum ScopeError {
    /// Errors reported by the serial port layer
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// Transport-level failures not covered by the serial layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// An operation that requires an open link was called while disconnected
    #[error("Not connected")]
    NotConnected,

    /// Errors loading or parsing configuration-style files
    /// (app config, signal database, plot layout)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors in the CSV logging state machine or log replay
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for serialscope operations
pub type Result<T> = std::result::Result<T, ScopeError>;
