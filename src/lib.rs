// sparkify2parquet - song catalog and listen logs to a Parquet star schema
//
// A run builds one DatasetContext from the configuration, then executes the
// catalog pipeline (songs, artists) and the activity pipeline (users, time,
// songplays). Errors abort the run; tables already written stay on disk.

mod error;
pub mod init;
pub mod pipeline;

pub use error::{ErrorKind, PipelineError, Result};
pub use pipeline::{process_activity, process_catalog, PipelineOptions, Pipelines};

use sparkify2parquet_config::RuntimeConfig;
use sparkify2parquet_storage::{DatasetContext, WriteSummary};

/// Tables written by one run, in write order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub tables: Vec<WriteSummary>,
}

impl RunSummary {
    pub fn table(&self, name: &str) -> Option<&WriteSummary> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Execute the selected pipelines against the configured roots
pub async fn run(config: &RuntimeConfig, pipelines: Pipelines) -> Result<RunSummary> {
    config
        .validate()
        .map_err(|e| PipelineError::config(format!("{:#}", e)))?;
    let options = PipelineOptions::from_config(&config.pipeline)?;
    let ctx = DatasetContext::from_config(config)?;
    run_with_context(&ctx, &options, pipelines).await
}

/// Execute the selected pipelines against an existing dataset context
pub async fn run_with_context(
    ctx: &DatasetContext,
    options: &PipelineOptions,
    pipelines: Pipelines,
) -> Result<RunSummary> {
    tracing::info!(
        input = %ctx.source.location(),
        output = %ctx.sink.location(),
        ?pipelines,
        "Starting run"
    );

    let mut summary = RunSummary::default();
    if pipelines.runs_catalog() {
        summary.tables.extend(process_catalog(ctx, options).await?);
    }
    if pipelines.runs_activity() {
        summary.tables.extend(process_activity(ctx, options).await?);
    }
    Ok(summary)
}
