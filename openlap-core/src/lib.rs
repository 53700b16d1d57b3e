//! OpenLap Core Library
//!
//! This crate provides the sample data model, track geometry algorithms
//! (viewport normalization and spline path smoothing), and the timeseries
//! source trait shared by the ingestion engine and source implementations.

pub mod bounds;
pub mod error;
pub mod model;
pub mod path;
pub mod source;

pub use bounds::{Bounds, Viewport};
pub use error::{GeometryError, ProvisionError, SourceError};
pub use model::{Point2D, RecordBatch, SampleKind, SessionBuffer};
pub use path::{smooth_path, PathCommand, PathResult, SmoothOptions};
pub use source::TimeseriesSource;
