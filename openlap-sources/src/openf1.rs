//! OpenF1 timeseries source
//!
//! HTTP client for the OpenF1 REST API (https://api.openf1.org). Maps the
//! `car_data`, `location`, and `weather` endpoints onto the unified record
//! model, and supplies session/driver metadata lookups used during
//! provisioning.
//!
//! The API filters by timestamp with `date>` / `date<` query parameters and
//! returns a plain JSON array; an empty array is a well-formed "no data"
//! response, not an error.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use openlap_core::{
    error::SourceError,
    model::{RecordBatch, SampleKind},
    source::TimeseriesSource,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

/// Window fetches ride on a generous timeout; historical queries over busy
/// race windows can take tens of seconds upstream.
const WINDOW_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Metadata lookups and the provisioning sample are smaller queries.
const METADATA_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// How much of the session start the representative full sample covers.
/// Five minutes is enough for at least one full lap in most sessions, which
/// makes the derived bounds cover the whole track extent.
const FULL_SAMPLE_SPAN: i64 = 5;

/// Session metadata returned by the `sessions` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_key: i64,
    pub session_name: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub circuit_short_name: Option<String>,
    pub country_name: Option<String>,
    pub year: Option<i32>,

    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

/// Driver metadata returned by the `drivers` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    pub driver_number: u32,
    pub full_name: Option<String>,
    pub name_acronym: Option<String>,
    pub team_name: Option<String>,
    pub team_colour: Option<String>,

    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

/// OpenF1 HTTP client.
pub struct OpenF1Source {
    base_url: String,
    client: reqwest::Client,
    // session key -> driver list, cached for the process lifetime
    drivers: Mutex<HashMap<String, Vec<DriverInfo>>>,
}

impl OpenF1Source {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at an alternate base URL (test servers, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            drivers: Mutex::new(HashMap::new()),
        }
    }

    fn endpoint_for(kind: SampleKind) -> &'static str {
        match kind {
            SampleKind::Telemetry => "car_data",
            SampleKind::Location => "location",
            SampleKind::Weather => "weather",
        }
    }

    /// The API rejects timezone suffixes on date filters; it expects naive
    /// UTC timestamps.
    fn format_date(ts: DateTime<Utc>) -> String {
        ts.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        timeout: std::time::Duration,
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(endpoint, ?params, "openf1 request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{endpoint}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "{endpoint}: upstream returned {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SourceError::Malformed(format!("{endpoint}: {e}")))
    }

    /// List sessions, optionally filtered by year. Defaults to races, which
    /// is what the caller almost always wants to provision.
    pub async fn sessions(
        &self,
        year: Option<i32>,
        session_name: &str,
    ) -> Result<Vec<SessionInfo>, SourceError> {
        let mut params = vec![("session_name", session_name.to_string())];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }
        self.get_json("sessions", &params, METADATA_TIMEOUT).await
    }

    /// Fetch metadata for one session key.
    pub async fn session_info(&self, key: &str) -> Result<Option<SessionInfo>, SourceError> {
        let params = [("session_key", key.to_string())];
        let mut sessions: Vec<SessionInfo> =
            self.get_json("sessions", &params, METADATA_TIMEOUT).await?;
        Ok(if sessions.is_empty() {
            None
        } else {
            Some(sessions.remove(0))
        })
    }

    /// Fetch the driver list for a session, cached per key.
    pub async fn drivers(&self, key: &str) -> Result<Vec<DriverInfo>, SourceError> {
        if let Some(cached) = self.drivers.lock().await.get(key) {
            return Ok(cached.clone());
        }

        let params = [("session_key", key.to_string())];
        let drivers: Vec<DriverInfo> =
            self.get_json("drivers", &params, METADATA_TIMEOUT).await?;
        self.drivers
            .lock()
            .await
            .insert(key.to_string(), drivers.clone());
        Ok(drivers)
    }

    /// The session start instant, parsed from session metadata.
    async fn session_start(&self, key: &str) -> Result<DateTime<Utc>, SourceError> {
        let info = self.session_info(key).await?.ok_or_else(|| {
            SourceError::Malformed(format!("session {key}: no metadata returned"))
        })?;
        let date_start = info.date_start.ok_or_else(|| {
            SourceError::Malformed(format!("session {key}: missing date_start"))
        })?;
        DateTime::parse_from_rfc3339(&date_start)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| SourceError::Malformed(format!("session {key}: bad date_start: {e}")))
    }
}

impl Default for OpenF1Source {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeseriesSource for OpenF1Source {
    async fn fetch_window(
        &self,
        key: &str,
        kind: SampleKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<RecordBatch, SourceError> {
        let endpoint = Self::endpoint_for(kind);
        let params = [
            ("session_key", key.to_string()),
            ("date>", Self::format_date(start)),
            ("date<", Self::format_date(end)),
        ];

        let batch = match kind {
            SampleKind::Telemetry => RecordBatch::Telemetry(
                self.get_json(endpoint, &params, WINDOW_TIMEOUT).await?,
            ),
            SampleKind::Location => RecordBatch::Location(
                self.get_json(endpoint, &params, WINDOW_TIMEOUT).await?,
            ),
            SampleKind::Weather => RecordBatch::Weather(
                self.get_json(endpoint, &params, WINDOW_TIMEOUT).await?,
            ),
        };
        Ok(batch)
    }

    async fn fetch_full_sample(
        &self,
        key: &str,
        kind: SampleKind,
    ) -> Result<RecordBatch, SourceError> {
        let start = self.session_start(key).await?;
        let end = start + Duration::minutes(FULL_SAMPLE_SPAN);

        let mut params = vec![
            ("session_key", key.to_string()),
            ("date>", Self::format_date(start)),
            ("date<", Self::format_date(end)),
        ];

        // Location sampling follows a single car; mixing drivers would
        // interleave positions all around the circuit.
        if kind == SampleKind::Location {
            let drivers = self.drivers(key).await?;
            if let Some(first) = drivers.first() {
                params.push(("driver_number", first.driver_number.to_string()));
            }
        }

        let endpoint = Self::endpoint_for(kind);
        let batch = match kind {
            SampleKind::Telemetry => RecordBatch::Telemetry(
                self.get_json(endpoint, &params, METADATA_TIMEOUT).await?,
            ),
            SampleKind::Location => RecordBatch::Location(
                self.get_json(endpoint, &params, METADATA_TIMEOUT).await?,
            ),
            SampleKind::Weather => RecordBatch::Weather(
                self.get_json(endpoint, &params, METADATA_TIMEOUT).await?,
            ),
        };
        Ok(batch)
    }
}
