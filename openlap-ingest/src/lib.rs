//! OpenLap Ingestion Engine
//!
//! Windowed background fetching of session timeseries data, viewport
//! provisioning, incremental reads, and snapshot persistence.

pub mod fetcher;
pub mod logging;
pub mod provision;
pub mod reader;
pub mod snapshot;
pub mod state;

pub use fetcher::start_ingestion;
pub use provision::{provision, Provisioned};
pub use reader::{read, ReadResult, DEFAULT_MAX_PER_KIND};
pub use snapshot::{JsonFileSink, NullSink, SnapshotSink};
pub use state::IngestState;
