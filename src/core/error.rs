use thiserror::Error;

#[derive(Error, Debug)]
pub enum RollupError {
    #[error("Schema setup failed at series '{series}': {source}")]
    Schema {
        series: String,
        #[source]
        source: Box<RollupError>,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Series not found: {0}")]
    SeriesNotFound(String),

    #[error("Series already exists: {0}")]
    SeriesExists(String),

    #[error("Series '{0}' is already the target of a compaction rule")]
    RuleExists(String),

    #[error("Invalid compaction rule: {0}")]
    InvalidRule(String),

    #[error("Timestamp {timestamp} is older than the last sample {last} of series '{series}'")]
    OutOfOrder { series: String, timestamp: i64, last: i64 },

    #[error("Invalid series name: {0}")]
    InvalidSeriesName(String),

    #[error("Invalid label selector '{0}': expected key=value")]
    InvalidSelector(String),

    #[error("Unknown aggregator: {0}")]
    UnknownAggregator(String),

    #[error("Series '{series}' has no '{label}' label")]
    MissingLabel { series: String, label: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Async task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Loop '{0}' stopped unexpectedly")]
    LoopExited(&'static str),
}

/// Result type alias for rollup operations
pub type Result<T> = std::result::Result<T, RollupError>;

impl RollupError {
    /// Creates a new store error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::Store(msg.into())
    }

    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Wraps a failure raised while creating `series` during schema setup
    pub fn schema<S: Into<String>>(series: S, source: RollupError) -> Self {
        Self::Schema {
            series: series.into(),
            source: Box::new(source),
        }
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::Store(_) | Self::OutOfOrder { .. } => "store",
            Self::SeriesNotFound(_) => "not_found",
            Self::SeriesExists(_) | Self::RuleExists(_) => "conflict",
            Self::InvalidRule(_)
            | Self::InvalidSeriesName(_)
            | Self::InvalidSelector(_)
            | Self::UnknownAggregator(_)
            | Self::MissingLabel { .. } => "validation",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Join(_) | Self::LoopExited(_) => "async",
        }
    }
}
