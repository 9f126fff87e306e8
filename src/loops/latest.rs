//! Periodically reports the newest raw sample.

use super::observer::Observer;
use crate::core::{Result, Sample, SeriesName};
use crate::storage::TimeSeriesStore;
use std::sync::Arc;
use std::time::Duration;

/// Latest-raw query loop state.
pub struct LatestLoop {
    store: Arc<dyn TimeSeriesStore>,
    series: SeriesName,
    observer: Arc<dyn Observer>,
    interval: Duration,
}

impl LatestLoop {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        series: SeriesName,
        observer: Arc<dyn Observer>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            series,
            observer,
            interval,
        }
    }

    /// Read the newest raw sample and hand it to the observer.
    ///
    /// `None` means nothing has been ingested yet and is not an error.
    pub async fn tick(&self) -> Result<Option<Sample>> {
        let sample = self.store.latest(&self.series).await?;
        self.observer.raw_latest(&self.series, sample);
        Ok(sample)
    }

    /// Sleep, read, repeat. Returns only with the first read error.
    pub async fn run(self) -> Result<()> {
        tracing::info!(series = %self.series, interval = ?self.interval, "latest query loop started");

        loop {
            tokio::time::sleep(self.interval).await;
            if let Err(e) = self.tick().await {
                tracing::error!(series = %self.series, category = e.category(), "latest read failed: {}", e);
                return Err(e);
            }
        }
    }
}
