//! In-memory time series store.
//!
//! Keeps every series in process, applies retention on append and evaluates
//! compaction rules the way a server-side store would: a bucket is written to
//! its target series once a sample lands in a later bucket.

use super::aggregator::{bucket_start, BucketAggregator};
use super::TimeSeriesStore;
use crate::core::{
    AggregatorKind, CompactionRule, LabelSelector, Labels, Result, RollupError, Sample,
    SeriesInfo, SeriesLatest, SeriesName, Timestamp,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A rule together with the bucket it is currently filling.
#[derive(Debug)]
struct RuleState {
    rule: CompactionRule,
    open: Option<BucketAggregator>,
}

#[derive(Debug)]
struct SeriesState {
    /// 0 keeps samples forever
    retention_ms: u64,
    labels: Labels,
    samples: VecDeque<Sample>,
    rules: Vec<RuleState>,
    source: Option<SeriesName>,
}

impl SeriesState {
    fn new(retention_ms: u64, labels: Labels) -> Self {
        Self {
            retention_ms,
            labels,
            samples: VecDeque::new(),
            rules: Vec::new(),
            source: None,
        }
    }

    /// Store `value` at `timestamp`. An equal timestamp overwrites the last
    /// sample, in which case `true` is returned.
    fn push(&mut self, name: &SeriesName, timestamp: i64, value: f64) -> Result<bool> {
        let overwrote = match self.samples.back_mut() {
            Some(last) if timestamp < last.timestamp => {
                return Err(RollupError::OutOfOrder {
                    series: name.to_string(),
                    timestamp,
                    last: last.timestamp,
                });
            },
            Some(last) if timestamp == last.timestamp => {
                last.value = value;
                true
            },
            _ => {
                self.samples.push_back(Sample::new(timestamp, value));
                false
            },
        };

        if self.retention_ms > 0 {
            let retention = i64::try_from(self.retention_ms).unwrap_or(i64::MAX);
            let horizon = timestamp.saturating_sub(retention);
            while self.samples.front().is_some_and(|s| s.timestamp < horizon) {
                self.samples.pop_front();
            }
        }

        Ok(overwrote)
    }

    /// Feed `value` to every rule, returning the buckets it closed.
    ///
    /// When the sample replaced an earlier one, the open bucket is refilled from
    /// the stored samples so the replaced value no longer counts.
    fn compact(
        &mut self,
        timestamp: i64,
        value: f64,
        overwrote: bool,
    ) -> Vec<(SeriesName, Sample)> {
        let mut closed = Vec::new();

        for state in &mut self.rules {
            let start = bucket_start(timestamp, state.rule.bucket_ms);
            match &mut state.open {
                Some(bucket) if bucket.start() == start && overwrote => {
                    *bucket = refill(state.rule.kind, start, state.rule.bucket_ms, &self.samples);
                },
                Some(bucket) if bucket.start() == start => bucket.add(value),
                _ => {
                    if let Some(finished) = state.open.take() {
                        if let Some(aggregate) = finished.value() {
                            closed.push((
                                state.rule.target.clone(),
                                Sample::new(finished.start(), aggregate),
                            ));
                        }
                    }
                    let mut bucket = BucketAggregator::new(state.rule.kind, start);
                    bucket.add(value);
                    state.open = Some(bucket);
                },
            }
        }

        closed
    }
}

/// Bucket starting at `start` holding every stored sample that falls into it.
fn refill(
    kind: AggregatorKind,
    start: i64,
    bucket_ms: u64,
    samples: &VecDeque<Sample>,
) -> BucketAggregator {
    let end = start.saturating_add(i64::try_from(bucket_ms).unwrap_or(i64::MAX));
    let mut bucket = BucketAggregator::new(kind, start);
    for sample in samples.iter().rev().take_while(|s| s.timestamp >= start) {
        if sample.timestamp < end {
            bucket.add(sample.value);
        }
    }
    bucket
}

/// In-process implementation of [`TimeSeriesStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: DashMap<SeriesName, Arc<Mutex<SeriesState>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of series held.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when no series exists.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    fn get(&self, name: &SeriesName) -> Result<Arc<Mutex<SeriesState>>> {
        self.series
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RollupError::SeriesNotFound(name.to_string()))
    }

    /// Append to `name` and write any closed buckets to their targets.
    ///
    /// The source lock is held until every target write is done, so closed
    /// buckets reach a target in the order they were closed. Locks are always
    /// taken source before target and a target is never itself a source.
    fn insert(&self, name: &SeriesName, timestamp: i64, value: f64) -> Result<()> {
        let series = self.get(name)?;
        let mut state = series.lock();

        let overwrote = state.push(name, timestamp, value)?;
        let closed = state.compact(timestamp, value, overwrote);

        for (target, sample) in closed {
            tracing::trace!(source = %name, target_series = %target, %sample, "bucket closed");
            self.insert(&target, sample.timestamp, sample.value)?;
        }

        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait::async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn exists(&self, name: &SeriesName) -> Result<bool> {
        Ok(self.series.contains_key(name))
    }

    async fn create_series(
        &self,
        name: &SeriesName,
        retention_ms: u64,
        labels: &Labels,
    ) -> Result<()> {
        match self.series.entry(name.clone()) {
            Entry::Occupied(_) => Err(RollupError::SeriesExists(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(SeriesState::new(retention_ms, labels.clone()))));
                tracing::debug!(series = %name, retention_ms, "series created");
                Ok(())
            },
        }
    }

    async fn create_rule(
        &self,
        source: &SeriesName,
        target: &SeriesName,
        bucket_ms: u64,
        kind: AggregatorKind,
    ) -> Result<()> {
        if source == target {
            return Err(RollupError::InvalidRule(format!("'{source}' cannot compact into itself")));
        }
        if bucket_ms == 0 {
            return Err(RollupError::InvalidRule("bucket duration must be greater than 0".into()));
        }

        let source_state = self.get(source)?;
        let target_state = self.get(target)?;

        if source_state.lock().source.is_some() {
            return Err(RollupError::InvalidRule(format!(
                "'{source}' is itself a compaction target"
            )));
        }

        {
            let mut target_state = target_state.lock();
            if target_state.source.is_some() {
                return Err(RollupError::RuleExists(target.to_string()));
            }
            if !target_state.rules.is_empty() {
                return Err(RollupError::InvalidRule(format!(
                    "'{target}' is already a compaction source"
                )));
            }
            target_state.source = Some(source.clone());
        }

        source_state.lock().rules.push(RuleState {
            rule: CompactionRule {
                target: target.clone(),
                bucket_ms,
                kind,
            },
            open: None,
        });

        tracing::debug!(%source, target_series = %target, bucket_ms, %kind, "rule created");
        Ok(())
    }

    async fn append(&self, name: &SeriesName, timestamp: Timestamp, value: f64) -> Result<i64> {
        let timestamp = match timestamp {
            Timestamp::Auto => now_ms(),
            Timestamp::At(ts) => ts,
        };
        self.insert(name, timestamp, value)?;
        Ok(timestamp)
    }

    async fn latest(&self, name: &SeriesName) -> Result<Option<Sample>> {
        let series = self.get(name)?;
        let state = series.lock();
        Ok(state.samples.back().copied())
    }

    async fn query_latest_by_label(
        &self,
        selector: &LabelSelector,
        with_labels: bool,
    ) -> Result<Vec<SeriesLatest>> {
        // Series locks are never taken while a map shard is held.
        let candidates: Vec<(SeriesName, Arc<Mutex<SeriesState>>)> = self
            .series
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut results = Vec::new();
        for (name, series) in candidates {
            let state = series.lock();
            if !selector.matches(&state.labels) {
                continue;
            }
            results.push(SeriesLatest {
                name,
                labels: if with_labels { state.labels.clone() } else { Labels::new() },
                sample: state.samples.back().copied(),
            });
        }

        Ok(results)
    }

    async fn info(&self, name: &SeriesName) -> Result<SeriesInfo> {
        let series = self.get(name)?;
        let state = series.lock();

        Ok(SeriesInfo {
            name: name.clone(),
            retention_ms: state.retention_ms,
            labels: state.labels.clone(),
            rules: state.rules.iter().map(|r| r.rule.clone()).collect(),
            source: state.source.clone(),
            total_samples: state.samples.len(),
        })
    }
}
