use super::{LogFormat, RuntimeConfig, S3Config};
use anyhow::{anyhow, Context, Result};
use sparkify2parquet_core::ArtistDedup;

pub const ENV_PREFIX: &str = "SPARKIFY2PARQUET_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the SPARKIFY2PARQUET_ prefix
    /// Used for AWS standard variables (AWS_ACCESS_KEY_ID, etc.)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Locations
    if let Some(root) = get_env_string(env, "INPUT_ROOT")? {
        config.storage.input_root = root;
    }
    if let Some(root) = get_env_string(env, "OUTPUT_ROOT")? {
        config.storage.output_root = root;
    }
    if let Some(val) = get_env_usize(env, "PARQUET_ROW_GROUP_SIZE")? {
        config.storage.parquet_row_group_size = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid SPARKIFY2PARQUET_LOG_FORMAT value")?;
    }

    // Pipeline
    if let Some(zone) = get_env_string(env, "TIMEZONE")? {
        config.pipeline.timezone = zone;
    }
    if let Some(policy) = get_env_string(env, "ARTIST_DEDUP")? {
        config.pipeline.artist_dedup = policy
            .parse::<ArtistDedup>()
            .map_err(|e| anyhow!("Invalid SPARKIFY2PARQUET_ARTIST_DEDUP value: {}", e))?;
    }
    if let Some(val) = get_env_bool(env, "SKIP_INVALID_TIMESTAMPS")? {
        config.pipeline.skip_invalid_timestamps = val;
    }
    if let Some(val) = get_env_usize(env, "SHARD_ROWS")? {
        config.pipeline.shard_rows = val;
    }
    if let Some(val) = get_env_usize(env, "READ_CONCURRENCY")? {
        config.pipeline.read_concurrency = val;
    }

    // S3
    if let Some(region) = get_env_string(env, "S3_REGION")? {
        ensure_s3(config).region = region;
    }
    if let Some(endpoint) = get_env_string(env, "S3_ENDPOINT")? {
        ensure_s3(config).endpoint = Some(endpoint);
    }
    // AWS standard credentials (without SPARKIFY2PARQUET_ prefix for compatibility)
    if let Some(access_key_id) = get_raw_env_string(env, "AWS_ACCESS_KEY_ID") {
        ensure_s3(config).access_key_id = Some(access_key_id);
    }
    if let Some(secret_access_key) = get_raw_env_string(env, "AWS_SECRET_ACCESS_KEY") {
        ensure_s3(config).secret_access_key = Some(secret_access_key);
    }

    Ok(())
}

fn ensure_s3(config: &mut RuntimeConfig) -> &mut S3Config {
    config.storage.s3.get_or_insert_with(S3Config::default)
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    match env.get(key) {
        Some(val) if val.trim().is_empty() => Err(anyhow!("{}{} must not be empty", ENV_PREFIX, key)),
        Some(val) => Ok(Some(val)),
        None => Ok(None),
    }
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get_raw(key).filter(|val| !val.trim().is_empty())
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    get_env_string(env, key)?
        .map(|val| {
            val.trim()
                .parse::<usize>()
                .with_context(|| format!("{}{} must be a positive integer", ENV_PREFIX, key))
        })
        .transpose()
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    get_env_string(env, key)?
        .map(|val| match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(anyhow!(
                "{}{} must be a boolean, got '{}'",
                ENV_PREFIX,
                key,
                other
            )),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapEnv(HashMap<String, String>);

    impl MapEnv {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
        }
    }

    impl EnvSource for MapEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
        }

        fn get_raw(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn test_overrides_apply() {
        let env = MapEnv::new(&[
            ("SPARKIFY2PARQUET_INPUT_ROOT", "s3://udacity-dend/"),
            ("SPARKIFY2PARQUET_OUTPUT_ROOT", "/tmp/out"),
            ("SPARKIFY2PARQUET_LOG_FORMAT", "json"),
            ("SPARKIFY2PARQUET_ARTIST_DEDUP", "first-wins"),
            ("SPARKIFY2PARQUET_SKIP_INVALID_TIMESTAMPS", "yes"),
            ("SPARKIFY2PARQUET_SHARD_ROWS", "1024"),
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
        ]);
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &env).unwrap();

        assert_eq!(config.storage.input_root, "s3://udacity-dend/");
        assert_eq!(config.storage.output_root, "/tmp/out");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.pipeline.artist_dedup, ArtistDedup::FirstWins);
        assert!(config.pipeline.skip_invalid_timestamps);
        assert_eq!(config.pipeline.shard_rows, 1024);
        let s3 = config.storage.s3.unwrap();
        assert_eq!(s3.access_key_id.as_deref(), Some("AKIDEXAMPLE"));
        assert_eq!(s3.region, "us-west-2");
    }

    #[test]
    fn test_no_env_leaves_config_untouched() {
        let mut config = RuntimeConfig::default();
        apply_env_overrides(&mut config, &MapEnv::new(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = RuntimeConfig::default();
        let bad_number = MapEnv::new(&[("SPARKIFY2PARQUET_SHARD_ROWS", "many")]);
        assert!(apply_env_overrides(&mut config, &bad_number).is_err());

        let bad_bool = MapEnv::new(&[("SPARKIFY2PARQUET_SKIP_INVALID_TIMESTAMPS", "maybe")]);
        assert!(apply_env_overrides(&mut config, &bad_bool).is_err());

        let empty = MapEnv::new(&[("SPARKIFY2PARQUET_OUTPUT_ROOT", "  ")]);
        assert!(apply_env_overrides(&mut config, &empty).is_err());
    }
}
