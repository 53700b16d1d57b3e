//! Timeseries source trait definition

use crate::error::SourceError;
use crate::model::{RecordBatch, SampleKind};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for remote timeseries providers
///
/// Each source is responsible for:
/// - Fetching one kind of sample records for a bounded time window
/// - Fetching a representative full sample used for provisioning
/// - Mapping provider payloads into the unified record model
#[async_trait]
pub trait TimeseriesSource: Send + Sync {
    /// Fetch all records of `kind` for `key` within `[start, end)`.
    ///
    /// Returns:
    /// - `Ok(batch)` with an empty batch on a well-formed "no data" response
    /// - `Err(SourceError::Unavailable)` on transport failure or timeout
    /// - `Err(SourceError::Malformed)` if the payload can't be decoded
    ///
    /// Every call must carry a timeout; nothing here may block indefinitely.
    async fn fetch_window(
        &self,
        key: &str,
        kind: SampleKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RecordBatch, SourceError>;

    /// Fetch a representative early sample of `kind` for `key`, used for
    /// bounds computation and track-path smoothing during provisioning.
    async fn fetch_full_sample(
        &self,
        key: &str,
        kind: SampleKind,
    ) -> Result<RecordBatch, SourceError>;
}
