//! Full-pipeline tests against the synthetic demo source

use chrono::{TimeZone, Utc};
use openlap_core::Viewport;
use openlap_ingest::{
    fetcher::start_ingestion,
    provision::provision,
    reader::{read, DEFAULT_MAX_PER_KIND},
    snapshot::NullSink,
    state::IngestState,
};
use openlap_sources::DemoSource;
use std::sync::Arc;
use std::time::Duration;

async fn wait_idle(state: &IngestState, key: &str) {
    for _ in 0..500 {
        if !state.is_active(key).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("ingestion for {key} did not terminate");
}

#[tokio::test]
async fn test_demo_session_provisions_and_ingests() {
    let start = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
    let source = Arc::new(DemoSource::new(start, 10));
    let state = IngestState::new();
    let viewport = Viewport::default();

    let provisioned = provision(&state, source.as_ref(), "demo", &viewport)
        .await
        .unwrap();
    assert_eq!(provisioned.raw_sample_count, 300);
    assert!(provisioned.bounds.scale > 0.0);
    assert!(!provisioned.path.commands.is_empty());

    // The sample laps an uninterrupted ellipse; smoothing must not break it
    let moves = provisioned
        .path
        .commands
        .iter()
        .filter(|c| c.is_move())
        .count();
    assert_eq!(moves, 1);

    // 10 minutes of data = windows 0 and 1, then three empties
    start_ingestion(&state, source.clone(), Arc::new(NullSink), "demo", start).await;
    wait_idle(&state, "demo").await;

    let buffer = state.buffer("demo").await;
    assert_eq!(buffer.location.len(), 600);
    assert_eq!(buffer.telemetry.len(), 600);
    assert_eq!(buffer.weather.len(), 10);
    assert!(!buffer.last_ingested.is_empty());

    // Ingested coordinates were normalized into the viewport's ballpark
    let max_x = buffer
        .location
        .iter()
        .filter_map(|r| r.x)
        .fold(f64::NEG_INFINITY, f64::max);
    assert!(max_x <= viewport.width + 1.0, "raw coordinate leaked: {max_x}");

    // Poll everything, then poll from the cursor's end: nothing new
    let all = read(&state, "demo", "", DEFAULT_MAX_PER_KIND).await;
    assert_eq!(all.location.len(), 600);
    assert!(!all.is_ingesting);

    let newest = all.location.last().unwrap().date.clone();
    let after = read(&state, "demo", &newest, DEFAULT_MAX_PER_KIND).await;
    assert!(after.location.is_empty());
    assert!(after.telemetry.is_empty());
}
