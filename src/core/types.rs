use crate::core::error::{Result, RollupError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label set attached to a series. Ordering carries no meaning.
pub type Labels = BTreeMap<String, String>;

/// Label carrying the aggregator name on every derived series.
pub const TYPE_LABEL: &str = "type";

/// Longest accepted series name, in bytes.
pub const MAX_SERIES_NAME_LEN: usize = 255;

/// Name of a series in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesName(String);

impl SeriesName {
    /// Creates a new SeriesName after validation
    pub fn new(name: String) -> Result<Self> {
        if name.is_empty() {
            return Err(RollupError::InvalidSeriesName("series name cannot be empty".to_string()));
        }
        if name.len() > MAX_SERIES_NAME_LEN {
            return Err(RollupError::InvalidSeriesName(format!(
                "series name cannot exceed {MAX_SERIES_NAME_LEN} characters, got {}",
                name.len()
            )));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RollupError::InvalidSeriesName(format!("'{name}' contains whitespace")));
        }
        Ok(SeriesName(name))
    }

    /// Name of the series holding this series' rollup for `kind`, e.g. `sensor:average`.
    ///
    /// Fails when the suffixed name no longer fits the length limit.
    pub fn derived(&self, kind: AggregatorKind) -> Result<SeriesName> {
        SeriesName::new(format!("{}:{}", self.0, kind.as_str()))
    }

    /// Returns the string representation of the series name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string value
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SeriesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Timestamp of an appended sample, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Let the store stamp the sample with its current time
    Auto,
    /// Caller-supplied timestamp
    At(i64),
}

/// A single point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.timestamp, self.value)
    }
}

/// How raw points inside one bucket are folded into a derived point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregatorKind {
    Average,
    Minimum,
    Maximum,
}

impl AggregatorKind {
    /// Every kind, in declaration order.
    pub const ALL: [AggregatorKind; 3] =
        [AggregatorKind::Average, AggregatorKind::Minimum, AggregatorKind::Maximum];

    /// Name used in derived series names and in the `type` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregatorKind::Average => "average",
            AggregatorKind::Minimum => "minimum",
            AggregatorKind::Maximum => "maximum",
        }
    }
}

impl fmt::Display for AggregatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregatorKind {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "average" | "avg" => Ok(AggregatorKind::Average),
            "minimum" | "min" => Ok(AggregatorKind::Minimum),
            "maximum" | "max" => Ok(AggregatorKind::Maximum),
            _ => Err(RollupError::UnknownAggregator(s.to_string())),
        }
    }
}

/// Single equality predicate over series labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    pub key: String,
    pub value: String,
}

impl LabelSelector {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when `labels` carries `key` with exactly `value`.
    pub fn matches(&self, labels: &Labels) -> bool {
        labels.get(&self.key).is_some_and(|v| *v == self.value)
    }
}

impl FromStr for LabelSelector {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                Ok(LabelSelector::new(key.trim(), value.trim()))
            },
            _ => Err(RollupError::InvalidSelector(s.to_string())),
        }
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Compaction rule hanging off a source series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionRule {
    pub target: SeriesName,
    /// Width of one aggregation bucket in milliseconds
    pub bucket_ms: u64,
    pub kind: AggregatorKind,
}

/// One entry of a label-filtered latest read.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLatest {
    pub name: SeriesName,
    /// Empty unless labels were requested
    pub labels: Labels,
    /// `None` while the series holds no sample yet
    pub sample: Option<Sample>,
}

/// Metadata of a single series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesInfo {
    pub name: SeriesName,
    pub retention_ms: u64,
    pub labels: Labels,
    /// Rules reading from this series
    pub rules: Vec<CompactionRule>,
    /// Series this one is compacted from, if any
    pub source: Option<SeriesName>,
    pub total_samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_name_validation() {
        assert!(SeriesName::new(String::new()).is_err());
        assert!(SeriesName::new("has space".to_string()).is_err());
        assert!(SeriesName::new("x".repeat(256)).is_err());
        assert_eq!(SeriesName::new("sensor".to_string()).unwrap().as_str(), "sensor");
    }

    #[test]
    fn test_derived_names() {
        let raw = SeriesName::new("sensor".to_string()).unwrap();
        let names: Vec<String> = AggregatorKind::ALL
            .iter()
            .map(|k| raw.derived(*k).unwrap().into_inner())
            .collect();
        assert_eq!(names, vec!["sensor:average", "sensor:minimum", "sensor:maximum"]);
    }

    #[test]
    fn test_derived_name_respects_length_limit() {
        let raw = SeriesName::new("s".repeat(250)).unwrap();
        assert!(matches!(
            raw.derived(AggregatorKind::Average),
            Err(RollupError::InvalidSeriesName(_))
        ));

        let raw = SeriesName::new("s".repeat(247)).unwrap();
        assert_eq!(raw.derived(AggregatorKind::Maximum).unwrap().as_str().len(), 255);
    }

    #[test]
    fn test_aggregator_parsing() {
        assert_eq!("avg".parse::<AggregatorKind>().unwrap(), AggregatorKind::Average);
        assert_eq!("MIN".parse::<AggregatorKind>().unwrap(), AggregatorKind::Minimum);
        assert_eq!("maximum".parse::<AggregatorKind>().unwrap(), AggregatorKind::Maximum);
        assert!(matches!(
            "median".parse::<AggregatorKind>(),
            Err(RollupError::UnknownAggregator(_))
        ));
    }

    #[test]
    fn test_label_selector() {
        let selector: LabelSelector = "derived-from=sensor".parse().unwrap();
        assert_eq!(selector, LabelSelector::new("derived-from", "sensor"));
        assert_eq!(selector.to_string(), "derived-from=sensor");

        let mut labels = Labels::new();
        labels.insert("derived-from".into(), "sensor".into());
        assert!(selector.matches(&labels));

        labels.insert("derived-from".into(), "other".into());
        assert!(!selector.matches(&labels));

        assert!("no-equals".parse::<LabelSelector>().is_err());
        assert!("=value".parse::<LabelSelector>().is_err());
        assert!("key=".parse::<LabelSelector>().is_err());
    }

    #[test]
    fn test_sample_display() {
        assert_eq!(Sample::new(1_700_000_000_000, 42.0).to_string(), "1700000000000: 42");
    }
}
