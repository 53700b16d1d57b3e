//! Per-session ingestion state
//!
//! One `IngestState` owns everything keyed by session: cached viewport
//! bounds, the append-only sample buffers, and the set of sessions with a
//! fetch loop in flight. It is constructed once at process start and handed
//! by clone into every component, so the at-most-one-ingestion invariant is
//! testable instead of living in module globals.

use openlap_core::{
    model::{RecordBatch, SessionBuffer},
    Bounds,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared ingestion state registry
#[derive(Clone)]
pub struct IngestState {
    /// Cached viewport transform per session key. Written once per key;
    /// recomputing mid-stream would invalidate already-normalized records.
    bounds: Arc<RwLock<HashMap<String, Bounds>>>,

    /// Sample buffers per session key. The fetch loop is the only writer;
    /// appends happen under the write lock so readers observe them whole.
    buffers: Arc<RwLock<HashMap<String, SessionBuffer>>>,

    /// Session keys with an active fetch loop.
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl IngestState {
    pub fn new() -> Self {
        Self {
            bounds: Arc::new(RwLock::new(HashMap::new())),
            buffers: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// The cached bounds for a session, if provisioned.
    pub async fn bounds_for(&self, key: &str) -> Option<Bounds> {
        self.bounds.read().await.get(key).copied()
    }

    /// Cache bounds for a session. First write wins: a concurrent caller
    /// gets back whatever was cached first.
    pub async fn cache_bounds(&self, key: &str, bounds: Bounds) -> Bounds {
        let mut map = self.bounds.write().await;
        *map.entry(key.to_string()).or_insert(bounds)
    }

    /// Clone out the current buffer for a session, creating an empty one if
    /// the key has never been seen. Safe to call while ingestion is running;
    /// the buffer only ever grows between calls.
    pub async fn buffer(&self, key: &str) -> SessionBuffer {
        let mut map = self.buffers.write().await;
        map.entry(key.to_string()).or_default().clone()
    }

    /// Run a closure against the buffer under the read lock, without cloning
    /// the record vectors. Returns the closure's result; an absent key reads
    /// as an empty buffer.
    pub async fn with_buffer<R>(&self, key: &str, f: impl FnOnce(&SessionBuffer) -> R) -> R {
        let map = self.buffers.read().await;
        match map.get(key) {
            Some(buffer) => f(buffer),
            None => f(&SessionBuffer::default()),
        }
    }

    /// Append one window's batches to a session buffer, in arrival order,
    /// and advance the ingestion cursor to the window's latest timestamp.
    pub async fn append_window(&self, key: &str, batches: Vec<RecordBatch>) {
        let mut map = self.buffers.write().await;
        let buffer = map.entry(key.to_string()).or_default();
        for batch in batches {
            if let Some(date) = batch.max_date() {
                if date > buffer.last_ingested.as_str() {
                    buffer.last_ingested = date.to_string();
                }
            }
            match batch {
                RecordBatch::Telemetry(mut records) => buffer.telemetry.append(&mut records),
                RecordBatch::Location(mut records) => buffer.location.append(&mut records),
                RecordBatch::Weather(mut records) => buffer.weather.append(&mut records),
            }
        }
    }

    /// Whether a fetch loop is currently running for this session.
    pub async fn is_active(&self, key: &str) -> bool {
        self.in_flight.lock().await.contains(key)
    }

    /// Mark a session as in flight. Returns false when a loop already holds
    /// the slot, in which case the caller must not start another.
    pub async fn try_begin(&self, key: &str) -> bool {
        self.in_flight.lock().await.insert(key.to_string())
    }

    /// Clear the in-flight marker after a loop terminates or aborts.
    pub async fn finish(&self, key: &str) {
        self.in_flight.lock().await.remove(key);
    }
}

impl Default for IngestState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openlap_core::model::{LocationRecord, Point2D};
    use openlap_core::Viewport;
    use std::collections::HashMap as StdHashMap;

    fn location(date: &str, x: f64, y: f64) -> LocationRecord {
        LocationRecord {
            date: date.to_string(),
            driver_number: Some(1),
            x: Some(x),
            y: Some(y),
            z: None,
            extras: StdHashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_buffer_created_empty_on_first_reference() {
        let state = IngestState::new();
        let buffer = state.buffer("9472").await;
        assert!(buffer.is_empty());
        assert_eq!(buffer.last_ingested, "");
    }

    #[tokio::test]
    async fn test_append_window_advances_cursor() {
        let state = IngestState::new();
        state
            .append_window(
                "9472",
                vec![RecordBatch::Location(vec![
                    location("2024-03-02T15:00:01+00:00", 0.0, 0.0),
                    location("2024-03-02T15:00:02+00:00", 1.0, 1.0),
                ])],
            )
            .await;

        let buffer = state.buffer("9472").await;
        assert_eq!(buffer.location.len(), 2);
        assert_eq!(buffer.last_ingested, "2024-03-02T15:00:02+00:00");
    }

    #[tokio::test]
    async fn test_append_preserves_arrival_order() {
        let state = IngestState::new();
        state
            .append_window(
                "k",
                vec![RecordBatch::Location(vec![location("t1", 0.0, 0.0)])],
            )
            .await;
        state
            .append_window(
                "k",
                vec![RecordBatch::Location(vec![location("t2", 1.0, 0.0)])],
            )
            .await;

        let buffer = state.buffer("k").await;
        assert_eq!(buffer.location[0].date, "t1");
        assert_eq!(buffer.location[1].date, "t2");
    }

    #[tokio::test]
    async fn test_cache_bounds_first_write_wins() {
        let state = IngestState::new();
        let viewport = Viewport::default();
        let first =
            Bounds::compute(&[Point2D::new(0.0, 0.0), Point2D::new(10.0, 10.0)], &viewport)
                .unwrap();
        let second =
            Bounds::compute(&[Point2D::new(0.0, 0.0), Point2D::new(99.0, 99.0)], &viewport)
                .unwrap();

        let cached = state.cache_bounds("k", first).await;
        let ignored = state.cache_bounds("k", second).await;
        assert_eq!(cached.scale, ignored.scale);
        assert_eq!(state.bounds_for("k").await.unwrap().max_x, 10.0);
    }

    #[tokio::test]
    async fn test_try_begin_is_exclusive() {
        let state = IngestState::new();
        assert!(state.try_begin("k").await);
        assert!(!state.try_begin("k").await);
        assert!(state.is_active("k").await);

        state.finish("k").await;
        assert!(!state.is_active("k").await);
        assert!(state.try_begin("k").await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let state = IngestState::new();
        assert!(state.try_begin("a").await);
        assert!(state.try_begin("b").await);
        state
            .append_window(
                "a",
                vec![RecordBatch::Location(vec![location("t", 0.0, 0.0)])],
            )
            .await;
        assert!(state.buffer("b").await.is_empty());
        assert_eq!(state.buffer("a").await.total_len(), 1);
    }
}
