// Arrow schemas for the star-schema output tables
//
// Two catalog dimensions (songs, artists), two activity dimensions (users,
// time) and the songplays fact table.

use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

const SCHEMA_VERSION: &str = "1.0.0";

/// Column names shared by the table schemas and the partition specs
pub mod column {
    pub const SONG_ID: &str = "song_id";
    pub const TITLE: &str = "title";
    pub const ARTIST_ID: &str = "artist_id";
    pub const YEAR: &str = "year";
    pub const DURATION: &str = "duration";
    pub const ARTIST_NAME: &str = "artist_name";
    pub const ARTIST_LOCATION: &str = "artist_location";
    pub const ARTIST_LATITUDE: &str = "artist_latitude";
    pub const ARTIST_LONGITUDE: &str = "artist_longitude";
    pub const USER_ID: &str = "user_id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const GENDER: &str = "gender";
    pub const LEVEL: &str = "level";
    pub const START_TIME: &str = "start_time";
    pub const HOUR: &str = "hour";
    pub const DAY: &str = "day";
    pub const WEEK: &str = "week";
    pub const MONTH: &str = "month";
    pub const WEEKDAY: &str = "weekday";
    pub const SONGPLAY_ID: &str = "songplay_id";
    pub const SESSION_ID: &str = "session_id";
    pub const LOCATION: &str = "location";
    pub const USER_AGENT: &str = "user_agent";
}

fn start_time_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

fn with_version(fields: Vec<Field>) -> Arc<Schema> {
    let metadata = HashMap::from([(
        "sparkify2parquet.schema_version".to_string(),
        SCHEMA_VERSION.to_string(),
    )]);
    Arc::new(Schema::new_with_metadata(fields, metadata))
}

/// `songs`: {song_id, title, artist_id, year, duration}
pub fn songs_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        with_version(vec![
            Field::new(column::SONG_ID, DataType::Utf8, false),
            Field::new(column::TITLE, DataType::Utf8, false),
            Field::new(column::ARTIST_ID, DataType::Utf8, false),
            Field::new(column::YEAR, DataType::Int32, false),
            Field::new(column::DURATION, DataType::Float64, false),
        ])
    }))
}

/// `artists`: {artist_id, artist_name, artist_location, artist_latitude, artist_longitude}
pub fn artists_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        with_version(vec![
            Field::new(column::ARTIST_ID, DataType::Utf8, false),
            Field::new(column::ARTIST_NAME, DataType::Utf8, false),
            Field::new(column::ARTIST_LOCATION, DataType::Utf8, true),
            Field::new(column::ARTIST_LATITUDE, DataType::Float64, true),
            Field::new(column::ARTIST_LONGITUDE, DataType::Float64, true),
        ])
    }))
}

/// `users`: {user_id, first_name, last_name, gender, level}
///
/// Every column is nullable: logged-out events carry no identity.
pub fn users_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        with_version(vec![
            Field::new(column::USER_ID, DataType::Utf8, true),
            Field::new(column::FIRST_NAME, DataType::Utf8, true),
            Field::new(column::LAST_NAME, DataType::Utf8, true),
            Field::new(column::GENDER, DataType::Utf8, true),
            Field::new(column::LEVEL, DataType::Utf8, true),
        ])
    }))
}

/// `time`: {start_time, hour, day, week, month, year, weekday}
pub fn time_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        with_version(vec![
            Field::new(column::START_TIME, start_time_type(), false),
            Field::new(column::HOUR, DataType::Int32, false),
            Field::new(column::DAY, DataType::Int32, false),
            Field::new(column::WEEK, DataType::Int32, false),
            Field::new(column::MONTH, DataType::Int32, false),
            Field::new(column::YEAR, DataType::Int32, false),
            Field::new(column::WEEKDAY, DataType::Int32, false),
        ])
    }))
}

/// `songplays`: the fact table joining activity to catalog
pub fn songplays_schema() -> Arc<Schema> {
    static SCHEMA: OnceLock<Arc<Schema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        with_version(vec![
            Field::new(column::SONGPLAY_ID, DataType::Int64, false),
            Field::new(column::START_TIME, start_time_type(), false),
            Field::new(column::USER_ID, DataType::Utf8, true),
            Field::new(column::LEVEL, DataType::Utf8, true),
            Field::new(column::SONG_ID, DataType::Utf8, true),
            Field::new(column::ARTIST_ID, DataType::Utf8, true),
            Field::new(column::SESSION_ID, DataType::Int64, false),
            Field::new(column::LOCATION, DataType::Utf8, true),
            Field::new(column::USER_AGENT, DataType::Utf8, true),
            Field::new(column::YEAR, DataType::Int32, false),
            Field::new(column::MONTH, DataType::Int32, false),
        ])
    }))
}
