//! Demo source that generates synthetic session data for testing
//!
//! Simulates one car lapping an elliptical circuit at a fixed sample cadence,
//! with telemetry channels derived from track position and a slow weather
//! feed. Fully deterministic: the same window always yields the same records.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use openlap_core::{
    error::SourceError,
    model::{LocationRecord, RecordBatch, SampleKind, TelemetryRecord, WeatherRecord},
    source::TimeseriesSource,
};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Lap time of the synthetic circuit, seconds.
const LAP_SECONDS: f64 = 85.0;

/// Circuit extent in raw (un-normalized) source units.
const TRACK_RADIUS_X: f64 = 4500.0;
const TRACK_RADIUS_Y: f64 = 2800.0;

/// Synthetic timeseries source.
pub struct DemoSource {
    session_start: DateTime<Utc>,
    session_end: DateTime<Utc>,
    /// Seconds between consecutive location/telemetry samples.
    cadence_secs: i64,
}

impl DemoSource {
    pub fn new(session_start: DateTime<Utc>, session_minutes: i64) -> Self {
        Self {
            session_start,
            session_end: session_start + Duration::minutes(session_minutes),
            cadence_secs: 1,
        }
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    fn format_date(ts: DateTime<Utc>) -> String {
        ts.format("%Y-%m-%dT%H:%M:%S%.3f+00:00").to_string()
    }

    /// Sample instants of the session that fall within `[start, end)`.
    fn instants(&self, start: DateTime<Utc>, end: DateTime<Utc>, step_secs: i64) -> Vec<DateTime<Utc>> {
        let lo = start.max(self.session_start);
        let hi = end.min(self.session_end);
        let mut out = Vec::new();
        let mut elapsed = (lo - self.session_start).num_seconds();
        // Align to the cadence grid
        elapsed += (step_secs - elapsed.rem_euclid(step_secs)) % step_secs;
        loop {
            let ts = self.session_start + Duration::seconds(elapsed);
            if ts >= hi {
                break;
            }
            out.push(ts);
            elapsed += step_secs;
        }
        out
    }

    /// Position on the ellipse for a session-elapsed time.
    fn position_at(&self, ts: DateTime<Utc>) -> (f64, f64) {
        let elapsed = (ts - self.session_start).num_milliseconds() as f64 / 1000.0;
        let angle = elapsed / LAP_SECONDS * TAU;
        (TRACK_RADIUS_X * angle.cos(), TRACK_RADIUS_Y * angle.sin())
    }

    fn location_at(&self, ts: DateTime<Utc>) -> LocationRecord {
        let (x, y) = self.position_at(ts);
        LocationRecord {
            date: Self::format_date(ts),
            driver_number: Some(1),
            x: Some(x),
            y: Some(y),
            z: Some(0.0),
            extras: HashMap::new(),
        }
    }

    fn telemetry_at(&self, ts: DateTime<Utc>) -> TelemetryRecord {
        let elapsed = (ts - self.session_start).num_milliseconds() as f64 / 1000.0;
        let lap_t = (elapsed % LAP_SECONDS) / LAP_SECONDS;
        // Two straights and two corners per lap
        let pace = 0.5 + 0.5 * (lap_t * 2.0 * TAU).cos().abs();
        let speed = 80.0 + 240.0 * pace;
        TelemetryRecord {
            date: Self::format_date(ts),
            driver_number: Some(1),
            speed: Some(speed),
            rpm: Some(7000.0 + 5000.0 * pace),
            gear: Some((3.0 + 5.0 * pace) as i8),
            throttle: Some(100.0 * pace),
            brake: Some(if pace < 0.55 { 80.0 } else { 0.0 }),
            drs: Some(if pace > 0.9 { 12 } else { 0 }),
            extras: HashMap::new(),
        }
    }

    fn weather_at(&self, ts: DateTime<Utc>) -> WeatherRecord {
        let elapsed = (ts - self.session_start).num_seconds() as f64;
        WeatherRecord {
            date: Self::format_date(ts),
            air_temperature: Some(24.0 + (elapsed / 600.0).sin()),
            track_temperature: Some(38.0 + 2.0 * (elapsed / 600.0).sin()),
            humidity: Some(41.0),
            pressure: Some(1012.0),
            rainfall: Some(0.0),
            wind_direction: Some(170.0),
            wind_speed: Some(2.5),
            extras: HashMap::new(),
        }
    }
}

#[async_trait]
impl TimeseriesSource for DemoSource {
    async fn fetch_window(
        &self,
        _key: &str,
        kind: SampleKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RecordBatch, SourceError> {
        let batch = match kind {
            SampleKind::Telemetry => RecordBatch::Telemetry(
                self.instants(start, end, self.cadence_secs)
                    .into_iter()
                    .map(|ts| self.telemetry_at(ts))
                    .collect(),
            ),
            SampleKind::Location => RecordBatch::Location(
                self.instants(start, end, self.cadence_secs)
                    .into_iter()
                    .map(|ts| self.location_at(ts))
                    .collect(),
            ),
            // Weather stations report once a minute
            SampleKind::Weather => RecordBatch::Weather(
                self.instants(start, end, 60)
                    .into_iter()
                    .map(|ts| self.weather_at(ts))
                    .collect(),
            ),
        };
        Ok(batch)
    }

    async fn fetch_full_sample(
        &self,
        key: &str,
        kind: SampleKind,
    ) -> Result<RecordBatch, SourceError> {
        self.fetch_window(
            key,
            kind,
            self.session_start,
            self.session_start + Duration::minutes(5),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn demo() -> DemoSource {
        let start = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        DemoSource::new(start, 10)
    }

    #[tokio::test]
    async fn test_window_is_deterministic() {
        let source = demo();
        let start = source.session_start();
        let end = start + Duration::minutes(1);

        let a = source
            .fetch_window("demo", SampleKind::Location, start, end)
            .await
            .unwrap();
        let b = source
            .fetch_window("demo", SampleKind::Location, start, end)
            .await
            .unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), 60);
        assert_eq!(a.max_date(), b.max_date());
    }

    #[tokio::test]
    async fn test_window_outside_session_is_empty() {
        let source = demo();
        let start = source.session_start() + Duration::hours(2);
        let batch = source
            .fetch_window("demo", SampleKind::Location, start, start + Duration::minutes(5))
            .await
            .unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_full_sample_covers_at_least_one_lap() {
        let source = demo();
        let batch = source
            .fetch_full_sample("demo", SampleKind::Location)
            .await
            .unwrap();
        // 5 minutes at 1 Hz, more than one 85-second lap
        assert_eq!(batch.len(), 300);

        if let RecordBatch::Location(records) = batch {
            // The circuit loops: the first point recurs near the lap boundary
            let first = records[0].point().unwrap();
            let near_lap = records[85].point().unwrap();
            assert!(first.distance(&near_lap) < 400.0);
        } else {
            panic!("expected location batch");
        }
    }

    #[tokio::test]
    async fn test_weather_reports_once_a_minute() {
        let source = demo();
        let start = source.session_start();
        let batch = source
            .fetch_window("demo", SampleKind::Weather, start, start + Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(batch.len(), 5);
    }

    #[tokio::test]
    async fn test_timestamps_sort_lexically() {
        let source = demo();
        let start = source.session_start();
        let batch = source
            .fetch_window("demo", SampleKind::Telemetry, start, start + Duration::minutes(2))
            .await
            .unwrap();
        if let RecordBatch::Telemetry(records) = batch {
            for pair in records.windows(2) {
                assert!(pair[0].date < pair[1].date);
            }
        } else {
            panic!("expected telemetry batch");
        }
    }
}
