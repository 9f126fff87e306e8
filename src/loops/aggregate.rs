//! Periodically reports the newest value of every derived series.

use super::observer::Observer;
use crate::core::{AggregatorKind, LabelSelector, Result, RollupError, Sample, SeriesLatest, SeriesName};
use crate::schema::TYPE_LABEL;
use crate::storage::TimeSeriesStore;
use std::sync::Arc;
use std::time::Duration;

/// One derived series as seen by a single aggregate read.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReading {
    /// Value of the series' `type` label
    pub kind: String,
    pub series: SeriesName,
    pub sample: Option<Sample>,
}

impl AggregateReading {
    /// Takes the kind from the `type` label. Without labels, falls back to the
    /// `<raw>:<kind>` naming of derived series.
    fn from_latest(latest: SeriesLatest) -> Result<Self> {
        let kind = match latest.labels.get(TYPE_LABEL) {
            Some(kind) => kind.clone(),
            None => latest
                .name
                .as_str()
                .rsplit_once(':')
                .and_then(|(_, suffix)| suffix.parse::<AggregatorKind>().ok())
                .map(|kind| kind.as_str().to_string())
                .ok_or_else(|| RollupError::MissingLabel {
                    series: latest.name.to_string(),
                    label: TYPE_LABEL.to_string(),
                })?,
        };

        Ok(Self {
            kind,
            series: latest.name,
            sample: latest.sample,
        })
    }
}

/// Aggregate query loop state.
pub struct AggregateLoop {
    store: Arc<dyn TimeSeriesStore>,
    selector: LabelSelector,
    with_labels: bool,
    observer: Arc<dyn Observer>,
    interval: Duration,
}

impl AggregateLoop {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        selector: LabelSelector,
        with_labels: bool,
        observer: Arc<dyn Observer>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            selector,
            with_labels,
            observer,
            interval,
        }
    }

    /// Issue one label-filtered latest read and report every series it returns.
    ///
    /// Readings come back in whatever order the store produced them.
    pub async fn tick(&self) -> Result<Vec<AggregateReading>> {
        let results = self.store.query_latest_by_label(&self.selector, self.with_labels).await?;

        let mut readings = Vec::with_capacity(results.len());
        for latest in results {
            let reading = AggregateReading::from_latest(latest)?;
            self.observer.aggregate(&reading.kind, &reading.series, reading.sample);
            readings.push(reading);
        }

        Ok(readings)
    }

    /// Sleep, query, repeat. Returns only with the first query error.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            selector = %self.selector,
            interval = ?self.interval,
            "aggregate query loop started"
        );

        loop {
            tokio::time::sleep(self.interval).await;
            match self.tick().await {
                Ok(readings) => tracing::debug!(series = readings.len(), "aggregates read"),
                Err(e) => {
                    tracing::error!(
                        selector = %self.selector,
                        category = e.category(),
                        "aggregate query failed: {}",
                        e
                    );
                    return Err(e);
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Labels;

    fn latest(name: &str, labels: &[(&str, &str)]) -> SeriesLatest {
        SeriesLatest {
            name: SeriesName::new(name.to_string()).unwrap(),
            labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Labels>(),
            sample: Some(Sample::new(1, 2.0)),
        }
    }

    #[test]
    fn test_kind_from_type_label() {
        let reading = AggregateReading::from_latest(latest("x", &[("type", "average")])).unwrap();
        assert_eq!(reading.kind, "average");
    }

    #[test]
    fn test_kind_from_name_without_labels() {
        let reading = AggregateReading::from_latest(latest("sensor:max", &[])).unwrap();
        assert_eq!(reading.kind, "maximum");
    }

    #[test]
    fn test_unknown_kind_is_missing_label() {
        let err = AggregateReading::from_latest(latest("sensor:p99", &[])).unwrap_err();
        assert!(matches!(err, RollupError::MissingLabel { .. }));
    }
}
