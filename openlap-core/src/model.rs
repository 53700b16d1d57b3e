//! Sample data model
//!
//! Defines the per-kind record structures that the timeseries source returns.
//! Uses Option<T> for fields that the upstream API may omit.
//!
//! Timestamps are kept as ISO-8601 strings rather than parsed instants: the
//! incremental read cursor relies on strict lexical comparison against the
//! upstream `date` field, and re-encoding a parsed timestamp is not guaranteed
//! to round-trip byte-for-byte.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A raw or normalized planar coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The kinds of sample records a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Telemetry,
    Location,
    Weather,
}

impl SampleKind {
    pub const ALL: [SampleKind; 3] = [
        SampleKind::Telemetry,
        SampleKind::Location,
        SampleKind::Weather,
    ];
}

/// Car telemetry channels (upstream `car_data` endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// ISO-8601 capture timestamp
    pub date: String,

    pub driver_number: Option<u32>,

    /// Speed in km/h
    pub speed: Option<f64>,

    /// Engine RPM
    pub rpm: Option<f64>,

    /// Current gear (0 = neutral)
    #[serde(rename = "n_gear")]
    pub gear: Option<i8>,

    /// Throttle input (0-100)
    pub throttle: Option<f64>,

    /// Brake input (0-100)
    pub brake: Option<f64>,

    /// DRS activation state (upstream encodes this as a small integer)
    pub drs: Option<i32>,

    /// Upstream fields that don't fit the common model
    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

/// On-track position (upstream `location` endpoint).
///
/// Coordinates arrive in the source's arbitrary planar unit and are rewritten
/// in place to viewport units during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    /// ISO-8601 capture timestamp
    pub date: String,

    pub driver_number: Option<u32>,

    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,

    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl LocationRecord {
    /// The planar coordinate carried by this record, if both axes are present.
    pub fn point(&self) -> Option<Point2D> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point2D::new(x, y)),
            _ => None,
        }
    }

    /// Overwrite the planar coordinate (used when normalizing into viewport
    /// space). A record without both axes is left untouched.
    pub fn set_point(&mut self, p: Point2D) {
        if self.x.is_some() && self.y.is_some() {
            self.x = Some(p.x);
            self.y = Some(p.y);
        }
    }
}

/// Trackside weather station readings (upstream `weather` endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// ISO-8601 capture timestamp
    pub date: String,

    pub air_temperature: Option<f64>,
    pub track_temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub rainfall: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,

    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

/// One window's worth of records for a single kind.
#[derive(Debug, Clone)]
pub enum RecordBatch {
    Telemetry(Vec<TelemetryRecord>),
    Location(Vec<LocationRecord>),
    Weather(Vec<WeatherRecord>),
}

impl RecordBatch {
    pub fn kind(&self) -> SampleKind {
        match self {
            RecordBatch::Telemetry(_) => SampleKind::Telemetry,
            RecordBatch::Location(_) => SampleKind::Location,
            RecordBatch::Weather(_) => SampleKind::Weather,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Telemetry(v) => v.len(),
            RecordBatch::Location(v) => v.len(),
            RecordBatch::Weather(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty batch of the given kind.
    pub fn empty(kind: SampleKind) -> Self {
        match kind {
            SampleKind::Telemetry => RecordBatch::Telemetry(Vec::new()),
            SampleKind::Location => RecordBatch::Location(Vec::new()),
            SampleKind::Weather => RecordBatch::Weather(Vec::new()),
        }
    }

    /// The latest (lexically greatest) timestamp in this batch.
    pub fn max_date(&self) -> Option<&str> {
        match self {
            RecordBatch::Telemetry(v) => v.iter().map(|r| r.date.as_str()).max(),
            RecordBatch::Location(v) => v.iter().map(|r| r.date.as_str()).max(),
            RecordBatch::Weather(v) => v.iter().map(|r| r.date.as_str()).max(),
        }
    }
}

/// Per-session accumulating store of time-ordered records.
///
/// Append-only: the ingestion loop is the sole writer, and records are never
/// mutated or removed after insertion, so readers only need to tolerate the
/// vectors growing between reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionBuffer {
    pub telemetry: Vec<TelemetryRecord>,
    pub location: Vec<LocationRecord>,
    pub weather: Vec<WeatherRecord>,

    /// Lexically greatest timestamp ingested so far (empty until the first
    /// non-empty window lands).
    pub last_ingested: String,
}

impl SessionBuffer {
    /// Total records across all kinds.
    pub fn total_len(&self) -> usize {
        self.telemetry.len() + self.location.len() + self.weather.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}
