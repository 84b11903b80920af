//! Run-level error taxonomy

use sparkify2parquet_storage::StorageError;
use thiserror::Error;

/// Which side of the run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input unreachable, unreadable, empty or malformed
    SourceRead,
    /// A record could not be shaped into a table (non-numeric `ts`)
    Transform,
    /// Output unwritable
    SinkWrite,
    /// Settings rejected before any data was touched
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SourceRead => "source_read",
            ErrorKind::Transform => "transform",
            ErrorKind::SinkWrite => "sink_write",
            ErrorKind::Config => "config",
        }
    }
}

/// Failure of a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("transform failed: {0}")]
    Transform(#[from] sparkify2parquet_core::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn config(err: impl std::fmt::Display) -> Self {
        Self::Config(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(StorageError::InvalidConfig { .. }) | Self::Config(_) => ErrorKind::Config,
            Self::Storage(e) if e.is_source_error() => ErrorKind::SourceRead,
            Self::Storage(_) => ErrorKind::SinkWrite,
            Self::Transform(e) if e.is_source_error() => ErrorKind::SourceRead,
            Self::Transform(_) => ErrorKind::Transform,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
