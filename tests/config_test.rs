//! Configuration system tests.

use pretty_assertions::assert_eq;
use rollup_lib::cli::Cli;
use rollup_lib::core::{AggregatorKind, Config, ConfigBuilder, LogLevel};
use std::io::Write;
use std::time::Duration;

fn cli_with_config(path: std::path::PathBuf) -> Cli {
    Cli {
        config: Some(path),
        raw_series: None,
        debug: false,
        check_config: false,
        once: false,
        version: false,
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.series.raw_name, "sensor");
    assert_eq!(config.series.aggregators, AggregatorKind::ALL.to_vec());
    assert_eq!(config.ingest.interval, Duration::from_secs(1));
    assert_eq!(config.query.latest_interval, Duration::from_secs(1));
    assert_eq!(config.query.aggregate_interval, Duration::from_secs(5));
    assert!(config.query.with_labels);
}

#[test]
fn test_config_validation() {
    assert!(ConfigBuilder::new().value_range(50, 0).build().is_err());
    assert!(ConfigBuilder::new().raw_name("two words").build().is_err());

    let invalid = ConfigBuilder::new()
        .from_yaml("series:\n  group_label: type\n")
        .unwrap()
        .build();
    assert!(invalid.is_err());
}

#[test]
fn test_unknown_aggregator_in_yaml() {
    let result = ConfigBuilder::new().from_yaml("series:\n  aggregators: [median]\n");
    assert!(result.is_err());
}

#[tokio::test]
async fn test_load_config_file_with_override() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
series:
  raw_name: boiler
  aggregators: [minimum]
  group_label: rollup-of
logging:
  level: warn
  structured: true
"#
    )
    .unwrap();

    let config = cli_with_config(file.path().to_path_buf()).load_config().await.unwrap();
    assert_eq!(config.series.raw_name, "boiler");
    assert_eq!(config.series.aggregators, vec![AggregatorKind::Minimum]);
    assert_eq!(config.group_selector().to_string(), "rollup-of=boiler");
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert!(config.logging.structured);

    let cli = Cli {
        raw_series: Some("furnace".to_string()),
        ..cli_with_config(file.path().to_path_buf())
    };
    let config = cli.load_config().await.unwrap();
    assert_eq!(config.series.raw_name, "furnace");
}

#[tokio::test]
async fn test_invalid_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "series: [not, a, map]").unwrap();

    assert!(cli_with_config(file.path().to_path_buf()).load_config().await.is_err());
}
