//! Dataset context shared by both pipelines
//!
//! Built once from the runtime configuration and passed explicitly; nothing
//! here lives in process-wide state.

use crate::error::Result;
use crate::location::Location;
use crate::source::DatasetSource;
use crate::writer::TableWriter;
use sparkify2parquet_config::RuntimeConfig;

/// Source (input root) and sink (output root) of one run
#[derive(Clone)]
pub struct DatasetContext {
    pub source: DatasetSource,
    pub sink: TableWriter,
}

impl DatasetContext {
    pub fn new(source: DatasetSource, sink: TableWriter) -> Self {
        Self { source, sink }
    }

    /// Build operators for the configured input and output roots
    pub fn from_config(config: &RuntimeConfig) -> Result<Self> {
        let storage = &config.storage;
        let s3 = storage.s3.as_ref();

        let input = Location::parse(&storage.input_root)?;
        let output = Location::parse(&storage.output_root)?;

        let source = DatasetSource::new(
            input.operator(s3)?,
            input.clone(),
            config.pipeline.read_concurrency,
        );
        let sink = TableWriter::new(
            output.operator(s3)?,
            output.clone(),
            config.tables.clone(),
            storage.parquet_row_group_size,
        );

        tracing::debug!(input = %input, output = %output, "Dataset context ready");
        Ok(Self::new(source, sink))
    }
}
