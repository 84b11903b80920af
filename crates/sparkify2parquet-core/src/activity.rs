// Activity dimensions: users and time
//
// Users come from the whole log. Time, and later the fact table, only see
// song-play events whose `ts` has been turned into a calendar timestamp.

use arrow::array::{Int32Builder, RecordBatch, StringBuilder, TimestampMicrosecondBuilder};
use std::collections::HashSet;
use std::sync::Arc;

use crate::calendar::{epoch_millis_to_seconds, CalendarParts, CalendarZone};
use crate::error::{Error, Result};
use crate::records::{ActivityRecord, Level};
use crate::schema::{time_schema, users_schema};

/// What to do with a song-play event whose `ts` is not numeric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidTimestampPolicy {
    /// Abort with `Error::InvalidTimestamp`
    #[default]
    Fail,
    /// Drop the event and count it
    Skip,
}

/// A song-play event projected to the columns the fact table needs
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    pub ts_millis: i64,
    /// `ts_millis` floored to whole seconds
    pub epoch_seconds: i64,
    /// Calendar view of `epoch_seconds`
    pub datetime: CalendarParts,
    pub user_id: Option<String>,
    pub level: Option<Level>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Output of the song-play filter
#[derive(Debug, Default)]
pub struct PlayEvents {
    pub events: Vec<PlayEvent>,
    /// Events dropped under `InvalidTimestampPolicy::Skip`
    pub skipped_invalid_timestamps: usize,
}

type UserKey<'a> = (
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<&'a str>,
    Option<Level>,
);

/// Distinct `{user_id, first_name, last_name, gender, level}` tuples over the
/// unfiltered log, in first-seen order.
pub fn users_table(records: &[ActivityRecord]) -> Result<RecordBatch> {
    let mut seen: HashSet<UserKey<'_>> = HashSet::new();
    let distinct: Vec<UserKey<'_>> = records
        .iter()
        .map(|r| {
            (
                r.user_id.as_deref(),
                r.first_name.as_deref(),
                r.last_name.as_deref(),
                r.gender.as_deref(),
                r.level,
            )
        })
        .filter(|key| seen.insert(*key))
        .collect();

    let capacity = distinct.len();
    let mut user_id = StringBuilder::with_capacity(capacity, capacity * 4);
    let mut first_name = StringBuilder::with_capacity(capacity, capacity * 8);
    let mut last_name = StringBuilder::with_capacity(capacity, capacity * 8);
    let mut gender = StringBuilder::with_capacity(capacity, capacity);
    let mut level = StringBuilder::with_capacity(capacity, capacity * 4);

    for (uid, first, last, g, lvl) in distinct {
        user_id.append_option(uid);
        first_name.append_option(first);
        last_name.append_option(last);
        gender.append_option(g);
        level.append_option(lvl.map(|l| l.as_str()));
    }

    Ok(RecordBatch::try_new(
        users_schema(),
        vec![
            Arc::new(user_id.finish()),
            Arc::new(first_name.finish()),
            Arc::new(last_name.finish()),
            Arc::new(gender.finish()),
            Arc::new(level.finish()),
        ],
    )?)
}

/// Keep `page == "NextSong"` events and derive their calendar timestamp.
pub fn song_play_events(
    records: &[ActivityRecord],
    zone: CalendarZone,
    policy: InvalidTimestampPolicy,
) -> Result<PlayEvents> {
    let mut out = PlayEvents::default();

    for record in records.iter().filter(|r| r.is_song_play()) {
        let derived = record.ts.epoch_millis().and_then(|ms| {
            let secs = epoch_millis_to_seconds(ms);
            zone.decompose(secs).map(|parts| (ms, secs, parts))
        });

        let Some((ts_millis, epoch_seconds, datetime)) = derived else {
            match policy {
                InvalidTimestampPolicy::Fail => {
                    return Err(Error::InvalidTimestamp {
                        value: record.ts.0.to_string(),
                        path: record.origin.path.to_string(),
                        line: record.origin.line,
                    });
                }
                InvalidTimestampPolicy::Skip => {
                    out.skipped_invalid_timestamps += 1;
                    continue;
                }
            }
        };

        out.events.push(PlayEvent {
            ts_millis,
            epoch_seconds,
            datetime,
            user_id: record.user_id.clone(),
            level: record.level,
            song: record.song.clone(),
            artist: record.artist.clone(),
            session_id: record.session_id,
            location: record.location.clone(),
            user_agent: record.user_agent.clone(),
        });
    }

    if out.skipped_invalid_timestamps > 0 {
        tracing::warn!(
            skipped = out.skipped_invalid_timestamps,
            "Dropped song-play events with non-numeric timestamps"
        );
    }

    Ok(out)
}

/// One row per distinct `start_time` among the song-play events.
pub fn time_table(events: &[PlayEvent]) -> Result<RecordBatch> {
    let mut seen = HashSet::new();
    let distinct: Vec<&CalendarParts> = events
        .iter()
        .map(|e| &e.datetime)
        .filter(|parts| seen.insert(**parts))
        .collect();

    let capacity = distinct.len();
    let schema = time_schema();
    let mut start_time = TimestampMicrosecondBuilder::with_capacity(capacity)
        .with_data_type(schema.field(0).data_type().clone());
    let mut hour = Int32Builder::with_capacity(capacity);
    let mut day = Int32Builder::with_capacity(capacity);
    let mut week = Int32Builder::with_capacity(capacity);
    let mut month = Int32Builder::with_capacity(capacity);
    let mut year = Int32Builder::with_capacity(capacity);
    let mut weekday = Int32Builder::with_capacity(capacity);

    for parts in distinct {
        start_time.append_value(parts.start_time_micros);
        hour.append_value(parts.hour);
        day.append_value(parts.day);
        week.append_value(parts.week);
        month.append_value(parts.month);
        year.append_value(parts.year);
        weekday.append_value(parts.weekday);
    }

    Ok(RecordBatch::try_new(
        schema,
        vec![
            Arc::new(start_time.finish()),
            Arc::new(hour.finish()),
            Arc::new(day.finish()),
            Arc::new(week.finish()),
            Arc::new(month.finish()),
            Arc::new(year.finish()),
            Arc::new(weekday.finish()),
        ],
    )?)
}
