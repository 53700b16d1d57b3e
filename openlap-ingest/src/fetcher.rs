//! Background chunk fetch loop
//!
//! This module handles:
//! - Windowing over a session's timerange in fixed-width chunks
//! - Folding recoverable per-window source failures into the empty-window
//!   termination heuristic
//! - Normalizing location coordinates as records arrive
//! - Writing the final snapshot at natural termination

use crate::snapshot::SnapshotSink;
use crate::state::IngestState;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use openlap_core::{
    error::SourceError,
    model::{RecordBatch, SampleKind},
    source::TimeseriesSource,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Width of one fetch window.
pub const CHUNK_WIDTH_MINUTES: i64 = 5;

/// Upper bound on windows per ingestion run (4 hours of session time).
pub const MAX_CHUNKS: usize = 48;

/// Consecutive empty windows interpreted as "reached the end of available
/// data".
pub const EMPTY_STREAK_LIMIT: u32 = 3;

/// Cooperative pause between windows so a long run doesn't starve
/// co-resident tasks. Not a correctness requirement.
const INTER_CHUNK_PAUSE: Duration = Duration::from_millis(25);

/// Start the background fetch loop for a session.
///
/// Fire-and-forget: returns as soon as the task is spawned. At most one loop
/// runs per key at any time; a call while one is in flight is a no-op and
/// returns false.
pub async fn start_ingestion(
    state: &IngestState,
    source: Arc<dyn TimeseriesSource>,
    sink: Arc<dyn SnapshotSink>,
    key: &str,
    range_start: DateTime<Utc>,
) -> bool {
    if !state.try_begin(key).await {
        info!(key, "ingestion already in flight, ignoring");
        return false;
    }

    let state = state.clone();
    let key = key.to_string();
    tokio::spawn(async move {
        info!(key, %range_start, "ingestion started");
        match run_fetch_loop(&state, source.as_ref(), &key, range_start).await {
            Ok(windows) => {
                let buffer = state.buffer(&key).await;
                info!(key, windows, records = buffer.total_len(), "ingestion complete");
                if let Err(e) = sink.write(&key, &buffer) {
                    error!(key, "snapshot write failed: {e:#}");
                }
            }
            Err(e) => {
                // Pollers only observe is_active flipping false and the
                // buffer no longer growing; the error stays in the log.
                error!(key, "ingestion aborted: {e}");
            }
        }
        state.finish(&key).await;
    });
    true
}

/// Run the window loop to natural termination. Returns the number of windows
/// fetched, or the unexpected error that aborted the run.
async fn run_fetch_loop(
    state: &IngestState,
    source: &dyn TimeseriesSource,
    key: &str,
    range_start: DateTime<Utc>,
) -> Result<usize, SourceError> {
    let mut cursor = range_start;
    let mut empty_streak = 0u32;

    for window_idx in 0..MAX_CHUNKS {
        let window_end = cursor + ChronoDuration::minutes(CHUNK_WIDTH_MINUTES);

        let mut batches: Vec<RecordBatch> = Vec::with_capacity(SampleKind::ALL.len());
        for kind in SampleKind::ALL {
            match source.fetch_window(key, kind, cursor, window_end).await {
                Ok(batch) => batches.push(batch),
                Err(e) if e.is_recoverable() => {
                    // A failed window fetch counts as empty; no retry
                    warn!(key, ?kind, window_idx, "window fetch failed: {e}");
                }
                Err(e) => return Err(e),
            }
        }

        let window_total: usize = batches.iter().map(RecordBatch::len).sum();
        if window_total == 0 {
            empty_streak += 1;
            if empty_streak >= EMPTY_STREAK_LIMIT {
                info!(key, window_idx, "empty streak reached, assuming end of data");
                return Ok(window_idx + 1);
            }
        } else {
            empty_streak = 0;
            normalize_locations(state, key, &mut batches).await;
            state.append_window(key, batches).await;
        }

        // Cursor advances whether or not the window held data
        cursor = window_end;
        sleep(INTER_CHUNK_PAUSE).await;
    }

    info!(key, "chunk budget exhausted");
    Ok(MAX_CHUNKS)
}

/// Rewrite location coordinates into viewport space using the session's
/// cached bounds. Records pass through untouched when the session was never
/// provisioned.
async fn normalize_locations(state: &IngestState, key: &str, batches: &mut [RecordBatch]) {
    let Some(bounds) = state.bounds_for(key).await else {
        return;
    };
    for batch in batches {
        if let RecordBatch::Location(records) = batch {
            for record in records {
                if let Some(p) = record.point() {
                    record.set_point(bounds.normalize(p));
                }
            }
        }
    }
}
