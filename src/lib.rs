//! rollup - raw time series ingestion with continuously maintained rollups.
//!
//! rollup keeps one raw measurement series and one downsampled series per
//! configured aggregator (average, minimum, maximum), wired together by
//! compaction rules evaluated inside the store. Around that topology it runs
//! three independent activities against a shared store handle.
//!
//! # Features
//!
//! - **Idempotent setup**: the raw series, derived series and rules are created
//!   once, guarded by a single existence check on the raw series
//! - **Ingestion loop**: one generated sample appended per tick
//! - **Latest query loop**: reports the newest raw sample
//! - **Aggregate query loop**: reports every rollup selected by a label filter
//!
//! # Architecture
//!
//! - `core`: Domain types, configuration and errors
//! - `storage`: Store trait and the in-memory store
//! - `schema`: Topology setup
//! - `loops`: The three long-running activities
//! - `cli`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use rollup_lib::core::Config;
//! use rollup_lib::Application;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let app = Application::new(config)?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod application;
pub mod cli;
pub mod core;
pub mod loops;
pub mod schema;
pub mod storage;

// Re-export core types for convenience
pub use crate::application::Application;
pub use crate::core::{Config, Result};
