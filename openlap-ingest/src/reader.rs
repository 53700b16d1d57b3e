//! Incremental buffer reads
//!
//! Pollers pass the last timestamp they have seen and get back only newer
//! records, bounded per kind. Timestamp comparison is strict lexical
//! comparison on the upstream ISO-8601 strings; the cursor protocol depends
//! on exact byte equality with what was handed out previously, so the
//! records' `date` fields are never re-encoded.

use crate::state::IngestState;
use openlap_core::model::{LocationRecord, TelemetryRecord, WeatherRecord};
use serde::Serialize;

/// Default cap on records returned per kind in one read.
pub const DEFAULT_MAX_PER_KIND: usize = 1000;

/// One poll's worth of new records.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadResult {
    pub telemetry: Vec<TelemetryRecord>,
    pub location: Vec<LocationRecord>,
    pub weather: Vec<WeatherRecord>,

    /// Total records currently buffered across all kinds, before filtering.
    pub buffer_size: usize,

    /// Whether the fetch loop is still running. Lets callers distinguish
    /// "done, no more data" from "keep polling".
    pub is_ingesting: bool,
}

/// Read records strictly newer than `since`, truncated to the *first*
/// `max_per_kind` in arrival order. Taking the earliest matches rather than
/// the latest keeps the poller's cursor contiguous: the next poll picks up
/// exactly where the truncation cut off.
///
/// Never blocks on ingestion progress; an empty or absent buffer reads as
/// empty vectors.
pub async fn read(
    state: &IngestState,
    key: &str,
    since: &str,
    max_per_kind: usize,
) -> ReadResult {
    let mut result = state
        .with_buffer(key, |buffer| {
            fn newer_than<T: Clone>(
                records: &[T],
                date: impl Fn(&T) -> &str,
                since: &str,
                cap: usize,
            ) -> Vec<T> {
                records
                    .iter()
                    .filter(|r| date(r) > since)
                    .take(cap)
                    .cloned()
                    .collect()
            }

            ReadResult {
                telemetry: newer_than(&buffer.telemetry, |r| &r.date, since, max_per_kind),
                location: newer_than(&buffer.location, |r| &r.date, since, max_per_kind),
                weather: newer_than(&buffer.weather, |r| &r.date, since, max_per_kind),
                buffer_size: buffer.total_len(),
                is_ingesting: false,
            }
        })
        .await;

    result.is_ingesting = state.is_active(key).await;
    result
}
