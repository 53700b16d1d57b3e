//! Timeseries source implementations for OpenLap

pub mod demo;
pub mod openf1;

pub use demo::DemoSource;
pub use openf1::{DriverInfo, OpenF1Source, SessionInfo};
