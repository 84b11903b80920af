// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_storage_config(&config.storage)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_log_config(&config.log)?;
    validate_table_names(&config.tables)?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    if config.input_root.trim().is_empty() {
        bail!("storage.input_root must not be empty");
    }

    if config.output_root.trim().is_empty() {
        bail!("storage.output_root must not be empty");
    }

    if config.parquet_row_group_size == 0 {
        bail!("storage.parquet_row_group_size must be greater than 0");
    }

    if let Some(s3) = &config.s3 {
        if s3.region.is_empty() {
            bail!("storage.s3.region must not be empty");
        }
        if s3.access_key_id.is_some() != s3.secret_access_key.is_some() {
            bail!("storage.s3.access_key_id and storage.s3.secret_access_key must be set together");
        }
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<()> {
    if let Err(e) = config.timezone.parse::<CalendarZone>() {
        bail!("pipeline.timezone: {}", e);
    }

    if config.shard_rows == 0 {
        bail!("pipeline.shard_rows must be greater than 0");
    }

    if config.read_concurrency == 0 {
        bail!("pipeline.read_concurrency must be greater than 0");
    }

    if config.read_concurrency > 256 {
        warn!(
            read_concurrency = config.read_concurrency,
            "pipeline.read_concurrency is very large; may exhaust file handles"
        );
    }

    Ok(())
}

fn validate_log_config(config: &LogConfig) -> Result<()> {
    if config.level.trim().is_empty() {
        bail!("log.level must not be empty");
    }
    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.level) {
        bail!("log.level '{}' is not a valid filter directive: {}", config.level, e);
    }
    Ok(())
}

fn validate_table_names(tables: &TableNames) -> Result<()> {
    let names = [
        ("songs", &tables.songs),
        ("artists", &tables.artists),
        ("users", &tables.users),
        ("time", &tables.time),
        ("songplays", &tables.songplays),
    ];

    for (table, name) in names {
        let trimmed = name.trim_matches('/');
        if trimmed.is_empty() {
            bail!("tables.{} must not be empty", table);
        }
        if trimmed.split('/').any(|part| part == "..") {
            bail!("tables.{} must stay under the output root", table);
        }
    }

    // Each write clears its whole destination, so no destination may hold another
    for (table, name) in names {
        let dest = name.trim_matches('/');
        for (other_table, other) in names {
            if table == other_table {
                continue;
            }
            let other = other.trim_matches('/');
            if dest == other {
                bail!("tables.{} shares its destination with tables.{}", table, other_table);
            }
            if other.starts_with(&format!("{}/", dest)) {
                bail!("tables.{} contains the destination of tables.{}", table, other_table);
            }
        }
    }

    Ok(())
}
