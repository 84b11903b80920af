// Activity pipeline: log_data (+ a fresh catalog read) → users, time, songplays

use crate::error::Result;
use crate::pipeline::PipelineOptions;
use sparkify2parquet_core::{
    song_play_events, songplays_table, time_table, users_table, MonotonicIdGenerator,
};
use sparkify2parquet_storage::{DatasetContext, Table, WriteSummary};

/// Read the activity log and write the users, time and songplays tables
///
/// Users are drawn from every event; time and songplays only from song plays.
/// The catalog is read again here so this pipeline runs on its own.
pub async fn process_activity(
    ctx: &DatasetContext,
    options: &PipelineOptions,
) -> Result<Vec<WriteSummary>> {
    let activity = ctx.source.read_activity().await?;

    let users = users_table(&activity)?;
    tracing::debug!(
        events = activity.len(),
        users = users.num_rows(),
        "Derived users dimension"
    );
    let users_summary = ctx.sink.write_table(Table::Users, &users).await?;

    let plays = song_play_events(&activity, options.calendar_zone, options.timestamp_policy)?;
    tracing::info!(
        song_plays = plays.events.len(),
        skipped_invalid_timestamps = plays.skipped_invalid_timestamps,
        zone = %options.calendar_zone,
        "Filtered song-play events"
    );

    let time = time_table(&plays.events)?;
    let time_summary = ctx.sink.write_table(Table::Time, &time).await?;

    let catalog = ctx.source.read_catalog().await?;
    let ids = MonotonicIdGenerator::new(options.shard_rows);
    let songplays = songplays_table(&plays.events, &catalog, &ids)?;
    let songplays_summary = ctx.sink.write_table(Table::Songplays, &songplays).await?;

    tracing::info!("Activity pipeline completed");
    Ok(vec![users_summary, time_summary, songplays_summary])
}
