//! Command-line interface for rollup.
//!
//! Run `rollup` to set up the sensor series and start ingesting with
//! sensible defaults.

use crate::application::Application;
use crate::core::config::{ConfigBuilder, LoggingConfig};
use crate::core::{Config, Result, RollupError};
use clap::Parser;
use std::path::PathBuf;

/// Raw series ingestion with continuously maintained rollups
#[derive(Parser, Debug)]
#[command(name = "rollup")]
#[command(version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/rollup/config.yaml)
    #[arg(short, long, env = "ROLLUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Name of the raw series
    #[arg(long, env = "ROLLUP_RAW_SERIES")]
    pub raw_series: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "ROLLUP_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Set up the schema, run each loop once and exit
    #[arg(long)]
    pub once: bool,

    /// Show version information
    #[arg(short = 'V', long = "show-version")]
    pub version: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            path.clone()
        } else {
            let default_path = dirs::config_dir()
                .map(|d| d.join("rollup").join("config.yaml"))
                .unwrap_or_else(|| PathBuf::from("~/.config/rollup/config.yaml"));

            if default_path.exists() {
                default_path
            } else {
                return self.build_config_from_args(builder);
            }
        };

        match tokio::fs::read_to_string(&config_path).await {
            Ok(content) => {
                builder = builder.from_yaml(&content)?;
            },
            Err(e) if self.config.is_some() => {
                return Err(RollupError::config(format!(
                    "Failed to read config file {:?}: {}",
                    config_path, e
                )));
            },
            Err(_) => {},
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(name) = &self.raw_series {
            builder = builder.raw_name(name.clone());
        }

        builder.build()
    }

    /// Level to log at: `--debug` wins, then `ROLLUP_LOG_LEVEL`, then the config file.
    fn log_level<'a>(&self, logging: &'a LoggingConfig, env_level: Option<&'a str>) -> &'a str {
        if self.debug {
            "debug"
        } else {
            env_level.unwrap_or(logging.level.as_str())
        }
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self, logging: &LoggingConfig) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level = std::env::var("ROLLUP_LOG_LEVEL").ok();
        let log_level = self.log_level(logging, env_log_level.as_deref());

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let fmt_layer = if logging.structured {
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .compact()
        } else {
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .compact()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| RollupError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the rollup application.
pub async fn execute(cli: Cli) -> Result<()> {
    if cli.version {
        println!("rollup {}", env!("CARGO_PKG_VERSION"));
        println!("Raw series ingestion with continuously maintained rollups");
        return Ok(());
    }

    let config = cli.load_config().await?;
    cli.init_logging(&config.logging)?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Raw series: {}", config.series.raw_name);
        println!("  Retention: {:?}", config.series.retention);
        println!(
            "  Aggregators: {}",
            config
                .series
                .aggregators
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("  Rule bucket: {:?}", config.series.rule_bucket);
        println!("  Group selector: {}", config.group_selector());
        return Ok(());
    }

    let app = Application::new(config)?;

    if cli.once {
        tracing::info!("Running a single iteration of each loop...");
        app.run_once().await
    } else {
        app.run().await
    }
}
