//! Value generators for the ingestion loop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Produces the value of the next raw sample.
pub trait ValueSource: Send {
    fn next_value(&mut self) -> f64;
}

/// Uniformly distributed integers in a half-open range.
pub struct UniformSource {
    range: Range<i64>,
    rng: StdRng,
}

impl UniformSource {
    /// Seeded from OS entropy.
    ///
    /// # Panics
    /// If `range` is empty.
    pub fn new(range: Range<i64>) -> Self {
        Self::with_rng(range, StdRng::from_entropy())
    }

    /// Reproducible sequence for a given `seed`.
    pub fn seeded(range: Range<i64>, seed: u64) -> Self {
        Self::with_rng(range, StdRng::seed_from_u64(seed))
    }

    fn with_rng(range: Range<i64>, rng: StdRng) -> Self {
        assert!(!range.is_empty(), "value range {range:?} is empty");
        Self { range, rng }
    }
}

impl ValueSource for UniformSource {
    #[allow(clippy::cast_precision_loss)]
    fn next_value(&mut self) -> f64 {
        self.rng.gen_range(self.range.clone()) as f64
    }
}

/// Replays a fixed list of values, cycling when exhausted.
pub struct FixedSource {
    values: Vec<f64>,
    next: usize,
}

impl FixedSource {
    /// # Panics
    /// If `values` is empty.
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "fixed source needs at least one value");
        Self { values, next: 0 }
    }
}

impl ValueSource for FixedSource {
    fn next_value(&mut self) -> f64 {
        let value = self.values[self.next];
        self.next = (self.next + 1) % self.values.len();
        value
    }
}
