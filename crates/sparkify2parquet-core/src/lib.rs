// sparkify2parquet-core - Pure transform logic
//
// Turns decoded song catalog records and listen-log events into the Arrow
// RecordBatches of a star schema. No I/O, no async: callers hand in bytes or
// records and get batches back.
//
// Essence: records → dimension/fact batches.
// Accident: where the bytes live and where the Parquet files go.

pub mod activity;
pub mod calendar;
pub mod catalog;
pub mod error;
pub mod ids;
pub mod records;
pub mod schema;
pub mod songplays;

pub use activity::{song_play_events, time_table, users_table, InvalidTimestampPolicy, PlayEvent, PlayEvents};
pub use calendar::{epoch_millis_to_seconds, CalendarParts, CalendarZone, ParseZoneError};
pub use catalog::{artists_table, songs_table, ArtistDedup};
pub use error::{Error, Result};
pub use ids::MonotonicIdGenerator;
pub use records::{
    parse_activity_records, parse_catalog_records, ActivityRecord, CatalogRecord, Level,
    SONG_PLAY_PAGE,
};
pub use songplays::{join_on_artist_name, songplays_table};
