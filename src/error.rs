//! Error types for Synheart Gesture
//!
//! The detector core never fails; these errors only arise at the host
//! boundary (record parsing, configuration, stream ordering).

use thiserror::Error;

/// Errors that can occur while feeding or configuring a gesture session
#[derive(Debug, Error)]
pub enum GestureError {
    #[error("Failed to parse frame record: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid threshold {name}: {value} (expected a finite value in [0, 1])")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timestamp went backwards: {current} ms after {previous} ms")]
    NonMonotonicTimestamp { previous: f64, current: f64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
