//! Storage layer for sparkify2parquet
//!
//! Resolves the input and output roots to OpenDAL operators, discovers and
//! reads the JSON sources, and writes tables as Hive-partitioned Parquet with
//! full-overwrite semantics.

mod context;
mod encoding;
mod error;
mod location;
mod partition;
mod source;
mod table_mapping;
mod writer;

pub use context::DatasetContext;
pub use error::{ErrorCode, Result, StorageError};
pub use location::Location;
pub use partition::{escape_path_name, HIVE_DEFAULT_PARTITION};
pub use source::{DatasetSource, ACTIVITY_DIR, CATALOG_DIR};
pub use table_mapping::Table;
pub use writer::{TableWriter, WriteSummary};
