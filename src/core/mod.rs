//! Core domain models for rollup.
//!
//! Series names, samples, aggregator kinds, label selectors, configuration
//! and the crate-wide error type.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel};
pub use error::{Result, RollupError};
pub use types::{
    AggregatorKind, CompactionRule, LabelSelector, Labels, Sample, SeriesInfo, SeriesLatest,
    SeriesName, Timestamp, MAX_SERIES_NAME_LEN, TYPE_LABEL,
};
