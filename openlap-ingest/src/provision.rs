//! Session provisioning
//!
//! One-shot synchronous preparation of a session for display: derive (or
//! reuse) the viewport transform from a representative location sample, and
//! smooth that sample into a track path.

use crate::state::IngestState;
use openlap_core::{
    error::{GeometryError, ProvisionError},
    model::{Point2D, RecordBatch, SampleKind},
    path::{smooth_path, PathResult, SmoothOptions},
    source::TimeseriesSource,
    Bounds, Viewport,
};
use serde::Serialize;
use tracing::info;

/// Result of provisioning a session.
#[derive(Debug, Clone, Serialize)]
pub struct Provisioned {
    pub bounds: Bounds,
    pub path: PathResult,
    /// Location records in the representative sample, before filtering.
    pub raw_sample_count: usize,
}

/// Provision a session: compute and cache bounds from the source's
/// representative sample, then smooth the sample into a display path.
///
/// Bounds are cached per key for the life of the state; a second call reuses
/// the cached transform rather than recomputing, because records normalized
/// by the ingestion loop in the meantime were written with that transform.
pub async fn provision(
    state: &IngestState,
    source: &dyn TimeseriesSource,
    key: &str,
    viewport: &Viewport,
) -> Result<Provisioned, ProvisionError> {
    let batch = source.fetch_full_sample(key, SampleKind::Location).await?;
    let records = match batch {
        RecordBatch::Location(records) => records,
        other => {
            // A source handing back the wrong kind is a contract violation
            return Err(openlap_core::SourceError::Malformed(format!(
                "expected location sample, got {:?}",
                other.kind()
            ))
            .into());
        }
    };

    let raw_sample_count = records.len();
    let raw_points: Vec<Point2D> = records.iter().filter_map(|r| r.point()).collect();
    if raw_points.is_empty() {
        return Err(GeometryError::InsufficientData(format!(
            "session {key}: sample window held no coordinate-bearing records"
        ))
        .into());
    }

    let bounds = match state.bounds_for(key).await {
        Some(cached) => cached,
        None => {
            let computed = Bounds::compute(&raw_points, viewport)?;
            state.cache_bounds(key, computed).await
        }
    };

    let normalized: Vec<Point2D> = raw_points.iter().map(|p| bounds.normalize(*p)).collect();
    let path = smooth_path(&normalized, &SmoothOptions::default());

    info!(
        key,
        raw_sample_count,
        commands = path.commands.len(),
        closed = path.is_closed,
        "session provisioned"
    );

    Ok(Provisioned {
        bounds,
        path,
        raw_sample_count,
    })
}
