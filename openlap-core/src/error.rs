//! Error taxonomy for geometry and source operations

use thiserror::Error;

/// Failures while deriving geometry from sample data.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// No usable coordinate-bearing points in the sampling window. Surfaced
    /// to the provisioning caller; never retried internally.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

/// Failures reported by a timeseries source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure for a single window fetch (network error,
    /// timeout, non-2xx status). The ingestion loop recovers from this by
    /// treating the window as empty.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source responded but the payload did not match the expected
    /// shape. Not recoverable within an ingestion run.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SourceError {
    /// Whether the fetch loop may fold this error into the empty-window
    /// heuristic and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// Failures surfaced to provisioning callers.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
