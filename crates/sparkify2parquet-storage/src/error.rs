//! Error types for the storage crate

use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Source path unreachable, unreadable or holding a malformed record
    E001SourceRead,
    /// E002: Source directory empty or missing
    E002NoSourceFiles,
    /// E003: Destination unwritable
    E003SinkWrite,
    /// E004: Storage location or credentials invalid
    E004InvalidConfig,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001SourceRead => "E001",
            Self::E002NoSourceFiles => "E002",
            Self::E003SinkWrite => "E003",
            Self::E004InvalidConfig => "E004",
        }
    }
}

/// Errors raised while reading sources or writing tables
#[derive(Debug, Error)]
pub enum StorageError {
    /// Listing or reading a source object failed
    #[error("[{code}] Failed to read source '{path}': {reason}")]
    SourceRead {
        code: &'static str,
        path: String,
        reason: String,
    },

    /// A source file decoded to something other than the expected records
    #[error("[{code}] {source}")]
    Record {
        code: &'static str,
        #[source]
        source: sparkify2parquet_core::Error,
    },

    /// Nothing to read under a source directory
    #[error("[{code}] No .json files found under '{location}'\n\nCheck that the input root holds song_data/ and log_data/")]
    NoSourceFiles { code: &'static str, location: String },

    /// Encoding or uploading a table failed
    #[error("[{code}] Failed to write table '{table}' to '{destination}': {reason}")]
    SinkWrite {
        code: &'static str,
        table: String,
        destination: String,
        reason: String,
    },

    /// Invalid storage configuration
    #[error("[{code}] Invalid storage configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },
}

impl StorageError {
    pub fn source_read(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceRead {
            code: ErrorCode::E001SourceRead.as_str(),
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn record(source: sparkify2parquet_core::Error) -> Self {
        Self::Record {
            code: ErrorCode::E001SourceRead.as_str(),
            source,
        }
    }

    pub fn no_source_files(location: impl Into<String>) -> Self {
        Self::NoSourceFiles {
            code: ErrorCode::E002NoSourceFiles.as_str(),
            location: location.into(),
        }
    }

    pub fn sink_write(
        table: impl Into<String>,
        destination: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::SinkWrite {
            code: ErrorCode::E003SinkWrite.as_str(),
            table: table.into(),
            destination: destination.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E004InvalidConfig.as_str(),
            message: message.into(),
        }
    }

    /// Stable code of this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceRead { code, .. }
            | Self::Record { code, .. }
            | Self::NoSourceFiles { code, .. }
            | Self::SinkWrite { code, .. }
            | Self::InvalidConfig { code, .. } => *code,
        }
    }

    /// True for failures on the input side
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::SourceRead { .. } | Self::Record { .. } | Self::NoSourceFiles { .. }
        )
    }
}

/// Result type alias for StorageError
pub type Result<T> = std::result::Result<T, StorageError>;
