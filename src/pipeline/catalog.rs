// Catalog pipeline: song_data → songs, artists

use crate::error::Result;
use crate::pipeline::PipelineOptions;
use sparkify2parquet_core::{artists_table, songs_table};
use sparkify2parquet_storage::{DatasetContext, Table, WriteSummary};

/// Read the catalog and write the songs and artists dimensions
///
/// `songs` is partitioned by (year, artist_id); `artists` is unpartitioned.
/// A failure writing `artists` leaves the finished `songs` table in place.
pub async fn process_catalog(
    ctx: &DatasetContext,
    options: &PipelineOptions,
) -> Result<Vec<WriteSummary>> {
    let catalog = ctx.source.read_catalog().await?;

    let songs = songs_table(&catalog)?;
    tracing::debug!(
        records = catalog.len(),
        songs = songs.num_rows(),
        "Projected songs dimension"
    );
    let songs_summary = ctx.sink.write_table(Table::Songs, &songs).await?;

    let artists = artists_table(&catalog, options.artist_dedup)?;
    tracing::debug!(
        artists = artists.num_rows(),
        dedup = %options.artist_dedup,
        "Projected artists dimension"
    );
    let artists_summary = ctx.sink.write_table(Table::Artists, &artists).await?;

    tracing::info!("Catalog pipeline completed");
    Ok(vec![songs_summary, artists_summary])
}
