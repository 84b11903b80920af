// sparkify2parquet-config - Runtime configuration for the ETL run
//
// Supports configuration from multiple sources:
// 1. CLI flags (applied by the binary, highest priority)
// 2. Environment variables (SPARKIFY2PARQUET_* prefix)
// 3. Config file path from SPARKIFY2PARQUET_CONFIG env var
// 4. Config file contents from SPARKIFY2PARQUET_CONFIG_CONTENT env var
// 5. Default config file location (./sparkify2parquet.toml)
// 6. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sparkify2parquet_core::{ArtistDedup, CalendarZone, InvalidTimestampPolicy};
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use sources::ConfigOrigin;

/// Main runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub tables: TableNames,
}

/// Input/output locations and Parquet encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root holding `song_data/` and `log_data/` (local path or s3:// URI)
    #[serde(default = "default_input_root")]
    pub input_root: String,

    /// Root the five tables are written under (local path or s3:// URI)
    #[serde(default = "default_output_root")]
    pub output_root: String,

    #[serde(default = "default_parquet_row_group_size")]
    pub parquet_row_group_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Config>,
}

fn default_input_root() -> String {
    "./data".to_string()
}

fn default_output_root() -> String {
    "./output_data".to_string()
}

fn default_parquet_row_group_size() -> usize {
    32 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_root: default_input_root(),
            output_root: default_output_root(),
            parquet_row_group_size: default_parquet_row_group_size(),
            s3: None,
        }
    }
}

/// Settings applied to every s3:// root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Config {
    #[serde(default = "default_s3_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

fn default_s3_region() -> String {
    "us-west-2".to_string()
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: default_s3_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

/// Transform knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Zone for calendar fields: "local", "utc" or "+HH:MM"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub artist_dedup: ArtistDedup,

    /// Drop song plays with a non-numeric `ts` instead of failing the run
    #[serde(default)]
    pub skip_invalid_timestamps: bool,

    /// Rows per shard for songplay_id generation
    #[serde(default = "default_shard_rows")]
    pub shard_rows: usize,

    /// Source files fetched concurrently
    #[serde(default = "default_read_concurrency")]
    pub read_concurrency: usize,
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_shard_rows() -> usize {
    32 * 1024
}

fn default_read_concurrency() -> usize {
    16
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            artist_dedup: ArtistDedup::default(),
            skip_invalid_timestamps: false,
            shard_rows: default_shard_rows(),
            read_concurrency: default_read_concurrency(),
        }
    }
}

impl PipelineConfig {
    /// Parsed calendar zone; `validate` guarantees this succeeds
    pub fn calendar_zone(&self) -> Result<CalendarZone> {
        Ok(self.timezone.parse::<CalendarZone>()?)
    }

    pub fn timestamp_policy(&self) -> InvalidTimestampPolicy {
        if self.skip_invalid_timestamps {
            InvalidTimestampPolicy::Skip
        } else {
            InvalidTimestampPolicy::Fail
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// EnvFilter directive, e.g. "info" or "sparkify2parquet=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Destination directory names under the output root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNames {
    #[serde(default = "default_songs")]
    pub songs: String,
    #[serde(default = "default_artists")]
    pub artists: String,
    #[serde(default = "default_users")]
    pub users: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_songplays")]
    pub songplays: String,
}

fn default_songs() -> String {
    "songs".to_string()
}

fn default_artists() -> String {
    "artists".to_string()
}

fn default_users() -> String {
    "users".to_string()
}

fn default_time() -> String {
    "time".to_string()
}

fn default_songplays() -> String {
    "songplays".to_string()
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            songs: default_songs(),
            artists: default_artists(),
            users: default_users(),
            time: default_time(),
            songplays: default_songplays(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the default sources with priority.
    ///
    /// The result is not validated yet; call [`RuntimeConfig::validate`].
    pub fn load() -> Result<(Self, ConfigOrigin)> {
        sources::load_config()
    }

    /// Load configuration from an explicit file, then apply env overrides.
    /// Not validated.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Parse a TOML document on top of the built-in defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
