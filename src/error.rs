//! Error types shared across the crate.
//!
//! Misconfiguration is reported synchronously at the point it becomes
//! detectable: assignment time where possible, otherwise on entry to
//! execution. A sub-operation failure aborts the whole run and carries the
//! originating slice index for diagnostics.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SliceError>;

/// Errors produced by the slicing engine and its drivers.
#[derive(Debug, Error)]
pub enum SliceError {
    /// Invalid axis, incompatible or missing sub-operation stages, or
    /// mismatched inputs. Raised before any slice is processed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A slice index outside the volume extent. The controller never
    /// generates such indices; seeing this indicates an internal bug.
    #[error("slice index {index} out of bounds along axis {axis} (extent {extent})")]
    Bounds {
        axis: usize,
        index: usize,
        extent: usize,
    },

    /// A bound sub-operation failed while processing one slice.
    #[error("sub-operation failed on slice {index}: {source}")]
    Operation {
        index: usize,
        #[source]
        source: OpFailure,
    },

    /// Cooperative cancellation observed between slice iterations.
    #[error("execution cancelled")]
    Cancelled,

    /// Failure surfaced from the volume reader/writer helpers.
    #[error("{0}")]
    Io(String),
}

impl SliceError {
    pub fn config(message: impl Into<String>) -> Self {
        SliceError::Configuration(message.into())
    }

    pub fn io(message: impl Into<String>) -> Self {
        SliceError::Io(message.into())
    }
}

/// Failure reported by a sub-operation while processing a single slice.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OpFailure {
    message: String,
}

impl OpFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
