use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use sparkify2parquet::{init::init_tracing, Pipelines};
use sparkify2parquet_config::{ConfigOrigin, RuntimeConfig};
use std::path::PathBuf;

/// Batch ETL from song catalog and listen logs to a Parquet star schema
#[derive(Parser)]
#[command(name = "sparkify2parquet")]
#[command(version)]
#[command(about = "Batch ETL from song catalog and listen logs to a Parquet star schema", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input root holding song_data/ and log_data/ (path or s3:// URI)
    #[arg(short, long, value_name = "ROOT")]
    input: Option<String>,

    /// Output root for the five tables (path or s3:// URI)
    #[arg(short, long, value_name = "ROOT")]
    output: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Run only one pipeline
    #[arg(long, value_enum, value_name = "PIPELINE")]
    only: Option<Only>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Only {
    Catalog,
    Activity,
}

impl Cli {
    fn pipelines(&self) -> Pipelines {
        match self.only {
            Some(Only::Catalog) => Pipelines::Catalog,
            Some(Only::Activity) => Pipelines::Activity,
            None => Pipelines::All,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let (mut config, origin) = match &cli.config {
        Some(config_path) => {
            let config = RuntimeConfig::load_from_path(config_path).with_context(|| {
                format!("Failed to load config from {}", config_path.display())
            })?;
            (config, ConfigOrigin::File(config_path.clone()))
        }
        None => RuntimeConfig::load().context("Failed to load configuration")?,
    };
    apply_cli_overrides(&mut config, &cli);

    // Logging comes up first so warnings from validation in `run` are kept
    init_tracing(&config.log);
    tracing::debug!(source = %origin, "Loaded configuration");

    let summary = match sparkify2parquet::run(&config, cli.pipelines()).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "Run failed");
            return Err(e).context("sparkify2parquet run failed");
        }
    };

    for table in &summary.tables {
        tracing::info!(
            table = %table.table,
            destination = %table.destination,
            rows = table.rows,
            files = table.files,
            "Table written"
        );
    }
    tracing::info!(
        tables = summary.tables.len(),
        rows = summary.total_rows(),
        "Run completed"
    );
    Ok(())
}

fn apply_cli_overrides(config: &mut RuntimeConfig, cli: &Cli) {
    if let Some(input) = &cli.input {
        config.storage.input_root = input.clone();
    }
    if let Some(output) = &cli.output {
        config.storage.output_root = output.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_selects_pipelines() {
        let cli = Cli::try_parse_from(["sparkify2parquet"]).unwrap();
        assert_eq!(cli.pipelines(), Pipelines::All);

        let cli = Cli::try_parse_from(["sparkify2parquet", "--only", "catalog"]).unwrap();
        assert_eq!(cli.pipelines(), Pipelines::Catalog);

        let cli = Cli::try_parse_from(["sparkify2parquet", "--only", "activity"]).unwrap();
        assert_eq!(cli.pipelines(), Pipelines::Activity);

        assert!(Cli::try_parse_from(["sparkify2parquet", "--only", "songs"]).is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let cli = Cli::try_parse_from([
            "sparkify2parquet",
            "-i",
            "s3a://udacity-dend/",
            "--output",
            "/srv/lake",
            "-v",
            "debug",
        ])
        .unwrap();

        let mut config = RuntimeConfig::default();
        config.pipeline.timezone = "utc".to_string();
        apply_cli_overrides(&mut config, &cli);

        assert_eq!(config.storage.input_root, "s3a://udacity-dend/");
        assert_eq!(config.storage.output_root, "/srv/lake");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.pipeline.timezone, "utc");
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::try_parse_from(["sparkify2parquet", "-c", "etl.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("etl.toml")));

        let mut config = RuntimeConfig::default();
        apply_cli_overrides(&mut config, &cli);
        assert_eq!(config, RuntimeConfig::default());
    }
}
