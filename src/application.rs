//! Main application entry point for rollup.

use crate::core::{Config, Result, RollupError};
use crate::loops::{
    AggregateLoop, ConsoleObserver, IngestLoop, LatestLoop, Observer, UniformSource, ValueSource,
};
use crate::schema::{SchemaInitializer, SchemaOutcome, SchemaSpec};
use crate::storage::StoreHandle;
use std::future::Future;
use std::sync::Arc;

/// Main application struct that wires the store, the schema and the loops together.
pub struct Application {
    /// Store shared by setup and every loop
    store: StoreHandle,
    /// Where query loops report readings
    observer: Arc<dyn Observer>,
    /// Topology derived from the configuration
    schema: SchemaSpec,
    /// Application configuration
    config: Config,
}

impl Application {
    /// Create a new Application backed by an in-memory store.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(config, StoreHandle::in_memory())
    }

    /// Create a new Application on top of an existing store.
    pub fn with_store(config: Config, store: StoreHandle) -> Result<Self> {
        config.validate()?;
        let schema = SchemaSpec::from_config(&config)?;

        Ok(Self {
            store,
            observer: Arc::new(ConsoleObserver),
            schema,
            config,
        })
    }

    /// Replace the console observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Ensure the raw series, derived series and rules exist.
    pub async fn setup(&self) -> Result<SchemaOutcome> {
        SchemaInitializer::new(self.store.as_backend()).ensure_schema(&self.schema).await
    }

    /// Set up the schema, then run one iteration of each loop in turn.
    pub async fn run_once(&self) -> Result<()> {
        self.setup().await?;

        let sample = self.ingest_loop().tick().await?;
        tracing::info!(series = %self.schema.raw, %sample, "sample appended");
        self.latest_loop().tick().await?;
        self.aggregate_loop().tick().await?;

        Ok(())
    }

    /// Run until a loop fails or Ctrl-C is received.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal, stopping...");
        })
        .await
    }

    /// Set up the schema, start the three loops and wait for the first loop
    /// failure or for `shutdown` to resolve. Remaining loops are aborted.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(series = %self.schema.raw, "Starting rollup");

        match self.setup().await? {
            SchemaOutcome::Created { derived } => {
                tracing::info!(derived = derived.len(), "schema created");
            },
            SchemaOutcome::AlreadyPresent => {},
        }

        let mut ingest = tokio::spawn(self.ingest_loop().run());
        let mut latest = tokio::spawn(self.latest_loop().run());
        let mut aggregate = tokio::spawn(self.aggregate_loop().run());

        let result = tokio::select! {
            joined = &mut ingest => finished("ingest", joined),
            joined = &mut latest => finished("latest", joined),
            joined = &mut aggregate => finished("aggregate", joined),
            () = shutdown => Ok(()),
        };

        ingest.abort();
        latest.abort();
        aggregate.abort();

        result
    }

    /// Get a reference to the store handle.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Get a reference to the schema being maintained.
    pub fn schema(&self) -> &SchemaSpec {
        &self.schema
    }

    fn ingest_loop(&self) -> IngestLoop {
        let ingest = &self.config.ingest;
        let range = ingest.min_value..ingest.max_value;
        let source: Box<dyn ValueSource> = match ingest.seed {
            Some(seed) => Box::new(UniformSource::seeded(range, seed)),
            None => Box::new(UniformSource::new(range)),
        };

        IngestLoop::new(self.store.as_backend(), self.schema.raw.clone(), source, ingest.interval)
    }

    fn latest_loop(&self) -> LatestLoop {
        LatestLoop::new(
            self.store.as_backend(),
            self.schema.raw.clone(),
            Arc::clone(&self.observer),
            self.config.query.latest_interval,
        )
    }

    fn aggregate_loop(&self) -> AggregateLoop {
        AggregateLoop::new(
            self.store.as_backend(),
            self.schema.group_selector(),
            self.config.query.with_labels,
            Arc::clone(&self.observer),
            self.config.query.aggregate_interval,
        )
    }
}

/// Outcome of a loop task. Loops never end cleanly, so an `Ok` exit is an error too.
fn finished(
    name: &'static str,
    joined: std::result::Result<Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(Ok(())) => Err(RollupError::LoopExited(name)),
        Ok(Err(e)) => Err(e),
        Err(e) => Err(e.into()),
    }
}
