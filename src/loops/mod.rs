//! The three long-running activities.
//!
//! Each loop owns its timer and shares nothing with the others besides the
//! store handle. Every loop exposes `tick` for a single iteration and `run`
//! for the endless version, which returns only with the first store error.

pub mod aggregate;
pub mod ingest;
pub mod latest;
pub mod observer;
pub mod source;

pub use aggregate::{AggregateLoop, AggregateReading};
pub use ingest::IngestLoop;
pub use latest::LatestLoop;
pub use observer::{ConsoleObserver, Observer};
pub use source::{FixedSource, UniformSource, ValueSource};
