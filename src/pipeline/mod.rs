//! The two pipelines of a run
//!
//! Each is a plain async function over an explicit `DatasetContext`; neither
//! sees the other's output. The activity pipeline re-reads the catalog for its
//! join instead of borrowing the catalog pipeline's records.

mod activity;
mod catalog;

pub use activity::process_activity;
pub use catalog::process_catalog;

use crate::error::{PipelineError, Result};
use sparkify2parquet_config::PipelineConfig;
use sparkify2parquet_core::{ArtistDedup, CalendarZone, InvalidTimestampPolicy};

/// Transform knobs resolved from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub artist_dedup: ArtistDedup,
    pub calendar_zone: CalendarZone,
    pub timestamp_policy: InvalidTimestampPolicy,
    /// Rows per songplay_id shard
    pub shard_rows: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            artist_dedup: config.artist_dedup,
            calendar_zone: config.calendar_zone().map_err(PipelineError::config)?,
            timestamp_policy: config.timestamp_policy(),
            shard_rows: config.shard_rows,
        })
    }
}

/// Which pipelines a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pipelines {
    /// Catalog first, then activity
    #[default]
    All,
    Catalog,
    Activity,
}

impl Pipelines {
    pub fn runs_catalog(&self) -> bool {
        matches!(self, Pipelines::All | Pipelines::Catalog)
    }

    pub fn runs_activity(&self) -> bool {
        matches!(self, Pipelines::All | Pipelines::Activity)
    }
}
