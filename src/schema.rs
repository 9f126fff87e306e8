//! One-shot setup of the raw series and its rollups.

use crate::core::{AggregatorKind, Config, LabelSelector, Labels, Result, RollupError, SeriesName};
use crate::storage::TimeSeriesStore;
use std::sync::Arc;

pub use crate::core::TYPE_LABEL;

/// Topology the initializer establishes.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    pub raw: SeriesName,
    pub retention_ms: u64,
    pub labels: Labels,
    pub aggregators: Vec<AggregatorKind>,
    pub rule_bucket_ms: u64,
    /// Key of the label tying derived series to `raw`
    pub group_label: String,
}

impl SchemaSpec {
    /// Build the topology described by the `series` section of `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let series = &config.series;
        Ok(Self {
            raw: config.raw_series()?,
            retention_ms: millis(series.retention),
            labels: series.labels.clone(),
            aggregators: series.aggregators.clone(),
            rule_bucket_ms: millis(series.rule_bucket),
            group_label: series.group_label.clone(),
        })
    }

    /// Labels of the derived series for `kind`.
    pub fn derived_labels(&self, kind: AggregatorKind) -> Labels {
        let mut labels = Labels::new();
        labels.insert(TYPE_LABEL.to_string(), kind.as_str().to_string());
        labels.insert(self.group_label.clone(), self.raw.as_str().to_string());
        labels
    }

    /// Selector matching exactly the derived series of `raw`.
    pub fn group_selector(&self) -> LabelSelector {
        LabelSelector::new(self.group_label.clone(), self.raw.as_str())
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// What [`SchemaInitializer::ensure_schema`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// The raw series was missing; it and these derived series were created.
    Created { derived: Vec<SeriesName> },
    /// The raw series already existed; nothing was touched.
    AlreadyPresent,
}

/// Creates the raw series, its derived series and their compaction rules.
pub struct SchemaInitializer {
    store: Arc<dyn TimeSeriesStore>,
}

impl SchemaInitializer {
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self { store }
    }

    /// Establish the topology unless the raw series already exists.
    ///
    /// The raw series is the only thing checked: when it is present the derived
    /// series and rules are assumed to be too. Any failure aborts setup and leaves
    /// whatever was already created in place.
    pub async fn ensure_schema(&self, spec: &SchemaSpec) -> Result<SchemaOutcome> {
        let raw = &spec.raw;

        if self.store.exists(raw).await.map_err(|e| RollupError::schema(raw.as_str(), e))? {
            tracing::info!(series = %raw, "schema already present");
            return Ok(SchemaOutcome::AlreadyPresent);
        }

        self.store
            .create_series(raw, spec.retention_ms, &spec.labels)
            .await
            .map_err(|e| RollupError::schema(raw.as_str(), e))?;
        tracing::info!(series = %raw, retention_ms = spec.retention_ms, "raw series created");

        let mut derived = Vec::with_capacity(spec.aggregators.len());
        for kind in &spec.aggregators {
            let target = raw.derived(*kind).map_err(|e| RollupError::schema(raw.as_str(), e))?;

            self.store
                .create_series(&target, spec.retention_ms, &spec.derived_labels(*kind))
                .await
                .map_err(|e| RollupError::schema(target.as_str(), e))?;
            self.store
                .create_rule(raw, &target, spec.rule_bucket_ms, *kind)
                .await
                .map_err(|e| RollupError::schema(target.as_str(), e))?;

            tracing::info!(
                series = %target,
                aggregator = %kind,
                bucket_ms = spec.rule_bucket_ms,
                "derived series created"
            );
            derived.push(target);
        }

        Ok(SchemaOutcome::Created { derived })
    }
}
