//! Sinks for what the query loops read.

use crate::core::{Sample, SeriesName};

/// Receives every reading made by the query loops.
pub trait Observer: Send + Sync {
    /// Latest raw sample, `None` while the raw series is still empty.
    fn raw_latest(&self, series: &SeriesName, sample: Option<Sample>);

    /// Latest value of one derived series, keyed by its aggregator name.
    fn aggregate(&self, kind: &str, series: &SeriesName, sample: Option<Sample>);
}

/// Prints readings to stdout, one per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn raw_latest(&self, series: &SeriesName, sample: Option<Sample>) {
        match sample {
            Some(sample) => println!("{sample}"),
            None => println!("{series}: no data yet"),
        }
    }

    fn aggregate(&self, kind: &str, _series: &SeriesName, sample: Option<Sample>) {
        match sample {
            Some(sample) => println!("{kind}: {}", sample.value),
            None => println!("{kind}: no data yet"),
        }
    }
}
