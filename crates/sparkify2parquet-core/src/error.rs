//! Error types for the pure transform layer

use arrow::error::ArrowError;
use thiserror::Error;

/// Errors raised while decoding source records or shaping tables
#[derive(Debug, Error)]
pub enum Error {
    /// A source line is not valid JSON or misses a required field
    #[error("malformed record at {path}:{line}: {reason}")]
    MalformedRecord {
        /// Source file the record came from
        path: String,
        /// 1-based line number within the file
        line: usize,
        reason: String,
    },

    /// `ts` could not be coerced to epoch milliseconds
    #[error("invalid timestamp {value} on activity record at {path}:{line}")]
    InvalidTimestamp {
        value: String,
        path: String,
        line: usize,
    },

    /// Arrow refused to assemble a RecordBatch
    #[error("failed to build record batch: {0}")]
    Arrow(#[from] ArrowError),
}

impl Error {
    /// True when the error came from reading the source rather than transforming it
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
