//! Common test utilities and fixtures.

#![allow(dead_code)]

use parking_lot::Mutex;
use rollup_lib::core::{
    AggregatorKind, LabelSelector, Labels, Result, RollupError, Sample, SeriesInfo, SeriesLatest,
    SeriesName, Timestamp,
};
use rollup_lib::loops::Observer;
use rollup_lib::storage::{MemoryStore, TimeSeriesStore};
use std::collections::HashMap;

/// Store operations that can be counted and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Exists,
    CreateSeries,
    CreateRule,
    Append,
    Latest,
    Query,
    Info,
}

/// Memory store wrapper that counts calls and fails on demand.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    calls: Mutex<HashMap<Op, usize>>,
    /// Calls of an op beyond this many fail
    limits: Mutex<HashMap<Op, usize>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `allowed` calls of `op` succeed, fail every one after.
    pub fn fail_after(self, op: Op, allowed: usize) -> Self {
        self.limits.lock().insert(op, allowed);
        self
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn record(&self, op: Op) -> Result<()> {
        let count = {
            let mut calls = self.calls.lock();
            let count = calls.entry(op).or_insert(0);
            *count += 1;
            *count
        };

        match self.limits.lock().get(&op) {
            Some(allowed) if count > *allowed => {
                Err(RollupError::store(format!("injected {op:?} failure")))
            },
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl TimeSeriesStore for FaultyStore {
    async fn exists(&self, name: &SeriesName) -> Result<bool> {
        self.record(Op::Exists)?;
        self.inner.exists(name).await
    }

    async fn create_series(
        &self,
        name: &SeriesName,
        retention_ms: u64,
        labels: &Labels,
    ) -> Result<()> {
        self.record(Op::CreateSeries)?;
        self.inner.create_series(name, retention_ms, labels).await
    }

    async fn create_rule(
        &self,
        source: &SeriesName,
        target: &SeriesName,
        bucket_ms: u64,
        kind: AggregatorKind,
    ) -> Result<()> {
        self.record(Op::CreateRule)?;
        self.inner.create_rule(source, target, bucket_ms, kind).await
    }

    async fn append(&self, name: &SeriesName, timestamp: Timestamp, value: f64) -> Result<i64> {
        self.record(Op::Append)?;
        self.inner.append(name, timestamp, value).await
    }

    async fn latest(&self, name: &SeriesName) -> Result<Option<Sample>> {
        self.record(Op::Latest)?;
        self.inner.latest(name).await
    }

    async fn query_latest_by_label(
        &self,
        selector: &LabelSelector,
        with_labels: bool,
    ) -> Result<Vec<SeriesLatest>> {
        self.record(Op::Query)?;
        self.inner.query_latest_by_label(selector, with_labels).await
    }

    async fn info(&self, name: &SeriesName) -> Result<SeriesInfo> {
        self.record(Op::Info)?;
        self.inner.info(name).await
    }
}

/// Observer that keeps every reading.
#[derive(Default)]
pub struct RecordingObserver {
    pub raw: Mutex<Vec<Option<Sample>>>,
    pub aggregates: Mutex<Vec<(String, Option<Sample>)>>,
}

impl Observer for RecordingObserver {
    fn raw_latest(&self, _series: &SeriesName, sample: Option<Sample>) {
        self.raw.lock().push(sample);
    }

    fn aggregate(&self, kind: &str, _series: &SeriesName, sample: Option<Sample>) {
        self.aggregates.lock().push((kind.to_string(), sample));
    }
}

pub fn series(name: &str) -> SeriesName {
    SeriesName::new(name.to_string()).expect("valid series name")
}
