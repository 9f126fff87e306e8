//! Configuration management for rollup.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - CLI argument overrides
//! - Validation and defaults

use crate::core::types::{AggregatorKind, LabelSelector, Labels, SeriesName, TYPE_LABEL};
use crate::core::{Result, RollupError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Complete configuration for rollup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw series and rollup topology
    pub series: SeriesConfig,
    /// Ingestion loop configuration
    pub ingest: IngestConfig,
    /// Query loops configuration
    pub query: QueryConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Series topology configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Name of the raw series
    pub raw_name: String,
    /// Retention of the raw and derived series
    #[serde(with = "humantime_serde")]
    pub retention: Duration,
    /// Labels attached to the raw series
    pub labels: Labels,
    /// One derived series is maintained per entry, in this order
    pub aggregators: Vec<AggregatorKind>,
    /// Width of one compaction bucket
    #[serde(with = "humantime_serde")]
    pub rule_bucket: Duration,
    /// Label key tying derived series back to the raw series
    pub group_label: String,
}

/// Ingestion loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Pause after each append
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Inclusive lower bound of generated values
    pub min_value: i64,
    /// Exclusive upper bound of generated values
    pub max_value: i64,
    /// Fixed RNG seed, for reproducible runs
    pub seed: Option<u64>,
}

/// Query loops configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Pause before each latest raw read
    #[serde(with = "humantime_serde")]
    pub latest_interval: Duration,
    /// Pause before each aggregate read
    #[serde(with = "humantime_serde")]
    pub aggregate_interval: Duration,
    /// Ask the store to return label sets with aggregate results
    pub with_labels: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Structured logging format
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        let mut labels = Labels::new();
        labels.insert("id".to_string(), "sensor-1".to_string());

        SeriesConfig {
            raw_name: "sensor".to_string(),
            retention: Duration::from_secs(60),
            labels,
            aggregators: AggregatorKind::ALL.to_vec(),
            rule_bucket: Duration::from_secs(5),
            group_label: "derived-from".to_string(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            interval: Duration::from_secs(1),
            min_value: 0,
            max_value: 50,
            seed: None,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            latest_interval: Duration::from_secs(1),
            aggregate_interval: Duration::from_secs(5),
            with_labels: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let series = &self.series;

        let raw = SeriesName::new(series.raw_name.clone())
            .map_err(|e| RollupError::config(format!("raw_name: {e}")))?;
        if series.raw_name.contains(':') {
            return Err(RollupError::config(format!(
                "raw_name must not contain ':', got '{}'",
                series.raw_name
            )));
        }

        if series.retention.as_millis() == 0 {
            return Err(RollupError::config("retention must be at least 1ms"));
        }
        if series.rule_bucket.as_millis() == 0 {
            return Err(RollupError::config("rule_bucket must be at least 1ms"));
        }

        if series.aggregators.is_empty() {
            return Err(RollupError::config("at least one aggregator must be configured"));
        }
        let mut seen = HashSet::new();
        for kind in &series.aggregators {
            if !seen.insert(kind) {
                return Err(RollupError::config(format!("aggregator '{kind}' is listed twice")));
            }
            raw.derived(*kind).map_err(|e| RollupError::config(format!("raw_name: {e}")))?;
        }

        if series.group_label.trim().is_empty() {
            return Err(RollupError::config("group_label cannot be empty"));
        }
        if series.group_label == TYPE_LABEL {
            return Err(RollupError::config(format!(
                "group_label '{TYPE_LABEL}' is reserved for the aggregator label"
            )));
        }
        // the raw series must not match the selector used to find derived series
        for reserved in [series.group_label.as_str(), TYPE_LABEL] {
            if series.labels.contains_key(reserved) {
                return Err(RollupError::config(format!(
                    "labels: '{reserved}' is reserved for derived series"
                )));
            }
        }

        if self.ingest.min_value >= self.ingest.max_value {
            return Err(RollupError::config(format!(
                "min_value must be below max_value, got [{}, {})",
                self.ingest.min_value, self.ingest.max_value
            )));
        }

        for (name, interval) in [
            ("ingest.interval", self.ingest.interval),
            ("query.latest_interval", self.query.latest_interval),
            ("query.aggregate_interval", self.query.aggregate_interval),
        ] {
            if interval.is_zero() {
                return Err(RollupError::config(format!("{name} must be greater than 0")));
            }
        }

        Ok(())
    }

    /// Validated name of the raw series
    pub fn raw_series(&self) -> Result<SeriesName> {
        SeriesName::new(self.series.raw_name.clone())
    }

    /// Selector matching every derived series of the raw series
    pub fn group_selector(&self) -> LabelSelector {
        LabelSelector::new(self.series.group_label.clone(), self.series.raw_name.clone())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| RollupError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the raw series name
    pub fn raw_name(mut self, name: impl Into<String>) -> Self {
        self.config.series.raw_name = name.into();
        self
    }

    /// Set the raw series retention
    pub fn retention(mut self, retention: Duration) -> Self {
        self.config.series.retention = retention;
        self
    }

    /// Set the compaction bucket width
    pub fn rule_bucket(mut self, bucket: Duration) -> Self {
        self.config.series.rule_bucket = bucket;
        self
    }

    /// Set the aggregators
    pub fn aggregators(mut self, kinds: Vec<AggregatorKind>) -> Self {
        self.config.series.aggregators = kinds;
        self
    }

    /// Set the generated value range
    pub fn value_range(mut self, min: i64, max: i64) -> Self {
        self.config.ingest.min_value = min;
        self.config.ingest.max_value = max;
        self
    }

    /// Set the ingestion interval
    pub fn ingest_interval(mut self, interval: Duration) -> Self {
        self.config.ingest.interval = interval;
        self
    }

    /// Set the raw series labels
    pub fn labels(mut self, labels: Labels) -> Self {
        self.config.series.labels = labels;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
