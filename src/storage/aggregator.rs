//! Per-bucket accumulation for compaction rules.

use crate::core::AggregatorKind;

/// Running state of one open compaction bucket.
#[derive(Debug, Clone)]
pub struct BucketAggregator {
    kind: AggregatorKind,
    /// Start of the bucket, aligned to a multiple of the bucket width
    start: i64,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl BucketAggregator {
    pub fn new(kind: AggregatorKind, start: i64) -> Self {
        Self {
            kind,
            start,
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Fold one value into the bucket.
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    /// Aggregate of everything added so far, `None` for an empty bucket.
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }

        Some(match self.kind {
            AggregatorKind::Average => self.sum / self.count as f64,
            AggregatorKind::Minimum => self.min,
            AggregatorKind::Maximum => self.max,
        })
    }
}

/// Start of the bucket of width `bucket_ms` containing `timestamp`.
pub fn bucket_start(timestamp: i64, bucket_ms: u64) -> i64 {
    let width = i64::try_from(bucket_ms).unwrap_or(i64::MAX);
    timestamp - timestamp.rem_euclid(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bucket_has_no_value() {
        let bucket = BucketAggregator::new(AggregatorKind::Average, 0);
        assert_eq!(bucket.value(), None);
    }

    #[test]
    fn test_each_kind() {
        let values = [4.0, 1.0, 7.0];
        let expected = [
            (AggregatorKind::Average, 4.0),
            (AggregatorKind::Minimum, 1.0),
            (AggregatorKind::Maximum, 7.0),
        ];

        for (kind, want) in expected {
            let mut bucket = BucketAggregator::new(kind, 5000);
            for v in values {
                bucket.add(v);
            }
            assert_eq!(bucket.value(), Some(want), "{kind}");
            assert_eq!(bucket.start(), 5000);
        }
    }

    #[test]
    fn test_bucket_alignment() {
        assert_eq!(bucket_start(0, 5000), 0);
        assert_eq!(bucket_start(4999, 5000), 0);
        assert_eq!(bucket_start(5000, 5000), 5000);
        assert_eq!(bucket_start(1_700_000_003_250, 5000), 1_700_000_000_000);
        assert_eq!(bucket_start(-1, 5000), -5000);
    }
}
