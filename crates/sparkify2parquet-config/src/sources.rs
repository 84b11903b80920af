// Configuration source loading.
//
// Priority order:
// 1. Environment variables (SPARKIFY2PARQUET_* prefix)
// 2. Config file path from SPARKIFY2PARQUET_CONFIG
// 3. Inline config content from SPARKIFY2PARQUET_CONFIG_CONTENT
// 4. Default config file (./sparkify2parquet.toml)
// 5. Built-in defaults
//
// Nothing here validates; callers validate once logging is up.

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::RuntimeConfig;
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILES: &[&str] = &["./sparkify2parquet.toml"];

/// Where the file layer of a configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// SPARKIFY2PARQUET_CONFIG_CONTENT
    Inline,
    Defaults,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Inline => write!(f, "{}CONFIG_CONTENT", ENV_PREFIX),
            ConfigOrigin::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Load configuration from the standard locations, falling back to defaults.
pub fn load_config() -> Result<(RuntimeConfig, ConfigOrigin)> {
    load_config_with(&StdEnvSource)
}

pub(crate) fn load_config_with<E: EnvSource>(env: &E) -> Result<(RuntimeConfig, ConfigOrigin)> {
    let (mut config, origin) = load_from_file(env)?;
    env_overrides::apply_env_overrides(&mut config, env)?;
    Ok((config, origin))
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<(RuntimeConfig, ConfigOrigin)> {
    if let Some(path) = env.get("CONFIG") {
        let path = PathBuf::from(path);
        let config = read_config_file(&path)?;
        return Ok((config, ConfigOrigin::File(path)));
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config = RuntimeConfig::from_toml_str(&content)
            .context("Failed to parse inline config from SPARKIFY2PARQUET_CONFIG_CONTENT")?;
        return Ok((config, ConfigOrigin::Inline));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            let config = read_config_file(path)?;
            return Ok((config, ConfigOrigin::File(path.to_path_buf())));
        }
    }

    Ok((RuntimeConfig::default(), ConfigOrigin::Defaults))
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    RuntimeConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let mut config = read_config_file(path.as_ref())?;
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
