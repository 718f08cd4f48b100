//! Error types.
//!
//! The classification core has no mid-tick failure modes. Errors surface only
//! at the boundaries: configuration is rejected when it is supplied, frames
//! are rejected before any state is touched, and recordings fail on load.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Corner;

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must lie in [{min}, {max}), got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("{field} must be greater than zero")]
    ZeroCapacity { field: &'static str },

    #[error("{field} must be at most {max} samples, got {value}")]
    CapacityTooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A frame rejected at the engine boundary. Rejected frames produce no
/// events and leave all state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame at {timestamp_ms} ms precedes previous frame at {previous_ms} ms")]
    NonMonotonicTimestamp { timestamp_ms: u64, previous_ms: u64 },

    #[error("non-finite reading on {corner:?} corner")]
    NonFiniteReading { corner: Corner },

    #[error("non-finite total weight")]
    NonFiniteTotal,
}

/// Failure while loading a recorded frame stream.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("cannot read recording: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
