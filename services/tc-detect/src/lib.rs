//! TC-like object detection driver.
//!
//! Exposes the configuration and per-case pipeline used by the `tc-detect`
//! binary.

pub mod config;
pub mod pipeline;

pub use config::{TcDetectConfig, TrackerConfig};
pub use pipeline::{CasePipeline, RunReport, Stage};
