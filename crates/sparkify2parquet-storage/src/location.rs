//! Root locators for the input and output datasets
//!
//! A root is either a local directory or an S3 bucket/prefix. Both become an
//! OpenDAL operator rooted at that location, so every path below it is
//! relative (`song_data/A/B/C/x.json`, `songs/year=2018/...`).

use crate::error::{Result, StorageError};
use opendal::{services, Operator};
use sparkify2parquet_config::S3Config;
use std::fmt;
use std::path::{Path, PathBuf};

const S3_SCHEMES: &[&str] = &["s3://", "s3a://", "s3n://"];
const FILE_SCHEME: &str = "file://";

/// Parsed storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Fs { root: PathBuf },
    S3 { bucket: String, prefix: String },
}

impl Location {
    /// Parse a root locator such as `./data`, `file:///data` or `s3a://bucket/prefix/`
    pub fn parse(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(StorageError::invalid_config("storage root must not be empty"));
        }

        for scheme in S3_SCHEMES {
            if let Some(rest) = uri.strip_prefix(scheme) {
                let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
                if bucket.is_empty() {
                    return Err(StorageError::invalid_config(format!(
                        "'{}' names no bucket",
                        uri
                    )));
                }
                return Ok(Self::S3 {
                    bucket: bucket.to_string(),
                    prefix: prefix.trim_matches('/').to_string(),
                });
            }
        }

        let path = match uri.strip_prefix(FILE_SCHEME) {
            Some(path) => path,
            None if uri.contains("://") => {
                return Err(StorageError::invalid_config(format!(
                    "unsupported storage scheme in '{}' (supported: s3://, s3a://, s3n://, file://, local path)",
                    uri
                )));
            }
            None => uri,
        };

        Ok(Self::Fs {
            root: absolute(Path::new(path))?,
        })
    }

    /// Build an OpenDAL operator rooted at this location
    pub fn operator(&self, s3: Option<&S3Config>) -> Result<Operator> {
        match self {
            Self::Fs { root } => {
                let builder = services::Fs::default().root(&root.to_string_lossy());
                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| {
                        StorageError::invalid_config(format!(
                            "Failed to create filesystem operator for '{}': {}",
                            root.display(),
                            e
                        ))
                    })
            }
            Self::S3 { bucket, prefix } => {
                let defaults = S3Config::default();
                let s3 = s3.unwrap_or(&defaults);

                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .region(&s3.region)
                    .root(&format!("/{}", prefix));

                if let Some(endpoint) = &s3.endpoint {
                    builder = builder.endpoint(endpoint);
                }
                if let Some(key) = &s3.access_key_id {
                    builder = builder.access_key_id(key);
                }
                if let Some(secret) = &s3.secret_access_key {
                    builder = builder.secret_access_key(secret);
                }

                Operator::new(builder)
                    .map(|op| op.finish())
                    .map_err(|e| {
                        StorageError::invalid_config(format!(
                            "Failed to create S3 operator for bucket '{}': {}",
                            bucket, e
                        ))
                    })
            }
        }
    }

    /// Human-readable form of `relative` under this root
    pub fn display_path(&self, relative: &str) -> String {
        format!("{}/{}", self.to_string().trim_end_matches('/'), relative)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fs { root } => write!(f, "{}", root.display()),
            Self::S3 { bucket, prefix } if prefix.is_empty() => write!(f, "s3://{}", bucket),
            Self::S3 { bucket, prefix } => write!(f, "s3://{}/{}", bucket, prefix),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| StorageError::invalid_config(format!("cannot resolve '{}': {}", path.display(), e)))
}
