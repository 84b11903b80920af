// Songplays fact table
//
// Song-play events are inner-joined to catalog records on
// `event.artist == catalog.artist_name`. The log carries no artist_id, so the
// free-text name is the only key. Matching is exact and case-sensitive;
// events without a match, and catalog rows nobody played, produce no rows.

use arrow::array::{
    Int32Builder, Int64Builder, RecordBatch, StringBuilder, TimestampMicrosecondBuilder,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::activity::PlayEvent;
use crate::error::Result;
use crate::ids::MonotonicIdGenerator;
use crate::records::CatalogRecord;
use crate::schema::songplays_schema;

/// One joined (event, catalog record) pair
#[derive(Debug, Clone, Copy)]
pub struct JoinedPlay<'a> {
    pub event: &'a PlayEvent,
    pub song: &'a CatalogRecord,
}

/// Hash join of events to catalog records by artist name.
///
/// Output order follows the events, then catalog order within an event's
/// matches.
pub fn join_on_artist_name<'a>(
    events: &'a [PlayEvent],
    catalog: &'a [CatalogRecord],
) -> Vec<JoinedPlay<'a>> {
    let mut by_artist: HashMap<&str, Vec<&CatalogRecord>> = HashMap::new();
    for record in catalog {
        by_artist
            .entry(record.artist_name.as_str())
            .or_default()
            .push(record);
    }

    events
        .iter()
        .filter_map(|event| {
            let artist = event.artist.as_deref()?;
            by_artist.get(artist).map(|songs| (event, songs))
        })
        .flat_map(|(event, songs)| songs.iter().map(move |&song| JoinedPlay { event, song }))
        .collect()
}

/// Build the fact table from song-play events and a catalog snapshot
pub fn songplays_table(
    events: &[PlayEvent],
    catalog: &[CatalogRecord],
    ids: &MonotonicIdGenerator,
) -> Result<RecordBatch> {
    let joined = join_on_artist_name(events, catalog);

    tracing::debug!(
        events = events.len(),
        catalog = catalog.len(),
        joined = joined.len(),
        "Joined song plays to catalog on artist name"
    );

    let capacity = joined.len();
    let schema = songplays_schema();
    let mut songplay_id = Int64Builder::with_capacity(capacity);
    let mut start_time = TimestampMicrosecondBuilder::with_capacity(capacity)
        .with_data_type(schema.field(1).data_type().clone());
    let mut user_id = StringBuilder::with_capacity(capacity, capacity * 4);
    let mut level = StringBuilder::with_capacity(capacity, capacity * 4);
    let mut song_id = StringBuilder::with_capacity(capacity, capacity * 18);
    let mut artist_id = StringBuilder::with_capacity(capacity, capacity * 18);
    let mut session_id = Int64Builder::with_capacity(capacity);
    let mut location = StringBuilder::with_capacity(capacity, capacity * 32);
    let mut user_agent = StringBuilder::with_capacity(capacity, capacity * 128);
    let mut year = Int32Builder::with_capacity(capacity);
    let mut month = Int32Builder::with_capacity(capacity);

    for (row, id) in joined.iter().zip(ids.ids(capacity)) {
        let event = row.event;
        songplay_id.append_value(id);
        start_time.append_value(event.datetime.start_time_micros);
        user_id.append_option(event.user_id.as_deref());
        level.append_option(event.level.map(|l| l.as_str()));
        song_id.append_value(&row.song.song_id);
        artist_id.append_value(&row.song.artist_id);
        session_id.append_value(event.session_id);
        location.append_option(event.location.as_deref());
        user_agent.append_option(event.user_agent.as_deref());
        year.append_value(event.datetime.year);
        month.append_value(event.datetime.month);
    }

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(songplay_id.finish()),
            Arc::new(start_time.finish()),
            Arc::new(user_id.finish()),
            Arc::new(level.finish()),
            Arc::new(song_id.finish()),
            Arc::new(artist_id.finish()),
            Arc::new(session_id.finish()),
            Arc::new(location.finish()),
            Arc::new(user_agent.finish()),
            Arc::new(year.finish()),
            Arc::new(month.finish()),
        ],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarZone;
    use crate::records::Level;
    use arrow::array::{Array, Int64Array, StringArray};

    fn play(artist: Option<&str>, session_id: i64) -> PlayEvent {
        PlayEvent {
            ts_millis: 1_541_990_258_796,
            epoch_seconds: 1_541_990_258,
            datetime: CalendarZone::utc().decompose(1_541_990_258).unwrap(),
            user_id: Some("15".to_string()),
            level: Some(Level::Paid),
            song: Some("Around The World".to_string()),
            artist: artist.map(str::to_string),
            session_id,
            location: Some("Paris".to_string()),
            user_agent: None,
        }
    }

    fn catalog(song_id: &str, artist_id: &str, artist_name: &str) -> CatalogRecord {
        CatalogRecord {
            song_id: song_id.to_string(),
            title: "Around The World".to_string(),
            artist_id: artist_id.to_string(),
            artist_name: artist_name.to_string(),
            artist_location: None,
            artist_latitude: None,
            artist_longitude: None,
            year: 1997,
            duration: 429.0,
        }
    }

    fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> &'a T {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<T>()
            .unwrap()
    }

    #[test]
    fn test_exact_artist_match_produces_one_row() {
        let events = vec![play(Some("Daft Punk"), 42)];
        let songs = vec![catalog("SO1", "AR1", "Daft Punk"), catalog("SO2", "AR2", "Justice")];

        let batch =
            songplays_table(&events, &songs, &MonotonicIdGenerator::default()).unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert_eq!(column::<Int64Array>(&batch, "session_id").value(0), 42);
        assert_eq!(column::<StringArray>(&batch, "song_id").value(0), "SO1");
        assert_eq!(column::<StringArray>(&batch, "artist_id").value(0), "AR1");
        assert_eq!(column::<StringArray>(&batch, "level").value(0), "paid");
        assert!(column::<StringArray>(&batch, "user_agent").is_null(0));
    }

    #[test]
    fn test_unmatched_events_are_dropped() {
        let events = vec![
            play(Some("daft punk"), 1),
            play(Some("Daft Punk "), 2),
            play(None, 3),
        ];
        let songs = vec![catalog("SO1", "AR1", "Daft Punk")];

        let batch =
            songplays_table(&events, &songs, &MonotonicIdGenerator::default()).unwrap();
        assert_eq!(batch.num_rows(), 0);
    }

    #[test]
    fn test_every_matching_catalog_row_joins() {
        let events = vec![play(Some("Daft Punk"), 1), play(Some("Daft Punk"), 2)];
        let songs = vec![
            catalog("SO1", "AR1", "Daft Punk"),
            catalog("SO2", "AR1", "Daft Punk"),
        ];

        let joined = join_on_artist_name(&events, &songs);
        let pairs: Vec<(i64, &str)> = joined
            .iter()
            .map(|j| (j.event.session_id, j.song.song_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![(1, "SO1"), (1, "SO2"), (2, "SO1"), (2, "SO2")]);
    }

    #[test]
    fn test_songplay_ids_increase() {
        let events: Vec<PlayEvent> = (0..5).map(|i| play(Some("Daft Punk"), i)).collect();
        let songs = vec![catalog("SO1", "AR1", "Daft Punk")];

        let batch = songplays_table(&events, &songs, &MonotonicIdGenerator::new(2)).unwrap();
        let ids = column::<Int64Array>(&batch, "songplay_id");
        let values: Vec<i64> = (0..ids.len()).map(|i| ids.value(i)).collect();
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(values[2], 1 << 33);
    }
}
