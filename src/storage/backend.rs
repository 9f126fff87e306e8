//! Store client trait consumed by the schema initializer and the loops.

use crate::core::{
    AggregatorKind, LabelSelector, Labels, Result, Sample, SeriesInfo, SeriesLatest, SeriesName,
    Timestamp,
};

/// Time series store capability.
///
/// Every call is fallible. Implementations must be shareable across tasks;
/// conflicting writes to one series are serialized by the store.
#[async_trait::async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Check whether a series exists.
    async fn exists(&self, name: &SeriesName) -> Result<bool>;

    /// Create a series. Fails if the name is taken.
    async fn create_series(&self, name: &SeriesName, retention_ms: u64, labels: &Labels)
        -> Result<()>;

    /// Register a compaction rule from `source` into `target`.
    async fn create_rule(
        &self,
        source: &SeriesName,
        target: &SeriesName,
        bucket_ms: u64,
        kind: AggregatorKind,
    ) -> Result<()>;

    /// Append one sample, returning the timestamp that was stored.
    async fn append(&self, name: &SeriesName, timestamp: Timestamp, value: f64) -> Result<i64>;

    /// Most recent sample of a series, `None` while it is empty.
    async fn latest(&self, name: &SeriesName) -> Result<Option<Sample>>;

    /// Most recent sample of every series matching `selector`, in no particular order.
    async fn query_latest_by_label(
        &self,
        selector: &LabelSelector,
        with_labels: bool,
    ) -> Result<Vec<SeriesLatest>>;

    /// Series metadata, including the rules reading from it.
    async fn info(&self, name: &SeriesName) -> Result<SeriesInfo>;
}
