//! Appends one generated sample to the raw series per tick.

use super::source::ValueSource;
use crate::core::{Result, Sample, SeriesName, Timestamp};
use crate::storage::TimeSeriesStore;
use std::sync::Arc;
use std::time::Duration;

/// Ingestion loop state.
pub struct IngestLoop {
    store: Arc<dyn TimeSeriesStore>,
    series: SeriesName,
    source: Box<dyn ValueSource>,
    interval: Duration,
    appended: u64,
}

impl IngestLoop {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        series: SeriesName,
        source: Box<dyn ValueSource>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            series,
            source,
            interval,
            appended: 0,
        }
    }

    /// Samples appended so far.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Append one sample stamped by the store.
    pub async fn tick(&mut self) -> Result<Sample> {
        let value = self.source.next_value();
        let timestamp = self.store.append(&self.series, Timestamp::Auto, value).await?;
        self.appended += 1;
        Ok(Sample::new(timestamp, value))
    }

    /// Append, sleep, repeat. Returns only with the first append error.
    ///
    /// The pause starts once the append has completed, so a slow store stretches
    /// the cadence instead of overlapping appends.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(series = %self.series, interval = ?self.interval, "ingestion loop started");

        loop {
            match self.tick().await {
                Ok(sample) => tracing::debug!(series = %self.series, %sample, "sample appended"),
                Err(e) => {
                    tracing::error!(
                        series = %self.series,
                        appended = self.appended,
                        category = e.category(),
                        "append failed: {}",
                        e
                    );
                    return Err(e);
                },
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
