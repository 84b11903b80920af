// Catalog dimensions: songs and artists
//
// Both tables are straight column projections of the catalog records.
// Songs keep one row per song_id; artists are only collapsed when an
// ArtistDedup policy asks for it.

use arrow::array::{Float64Builder, Int32Builder, RecordBatch, StringBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Result;
use crate::records::CatalogRecord;
use crate::schema::{artists_schema, songs_schema};

/// How to treat catalog records that share an `artist_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtistDedup {
    /// One artist row per catalog record
    #[default]
    None,
    /// Keep the first record seen for each artist_id
    FirstWins,
    /// Keep the last record seen for each artist_id
    LastWins,
}

impl FromStr for ArtistDedup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Same names serde accepts in the config file
        match s.trim() {
            "none" => Ok(ArtistDedup::None),
            "first-wins" => Ok(ArtistDedup::FirstWins),
            "last-wins" => Ok(ArtistDedup::LastWins),
            other => Err(format!(
                "unsupported artist dedup policy '{}': expected none, first-wins or last-wins",
                other
            )),
        }
    }
}

impl fmt::Display for ArtistDedup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtistDedup::None => write!(f, "none"),
            ArtistDedup::FirstWins => write!(f, "first-wins"),
            ArtistDedup::LastWins => write!(f, "last-wins"),
        }
    }
}

/// Project `{song_id, title, artist_id, year, duration}`.
///
/// The first record seen for a song_id wins.
pub fn songs_table(records: &[CatalogRecord]) -> Result<RecordBatch> {
    let capacity = records.len();
    let mut song_id = StringBuilder::with_capacity(capacity, capacity * 18);
    let mut title = StringBuilder::with_capacity(capacity, capacity * 32);
    let mut artist_id = StringBuilder::with_capacity(capacity, capacity * 18);
    let mut year = Int32Builder::with_capacity(capacity);
    let mut duration = Float64Builder::with_capacity(capacity);

    let mut seen = HashSet::with_capacity(capacity);
    for record in records {
        if !seen.insert(record.song_id.as_str()) {
            continue;
        }
        song_id.append_value(&record.song_id);
        title.append_value(&record.title);
        artist_id.append_value(&record.artist_id);
        year.append_value(record.year);
        duration.append_value(record.duration);
    }

    Ok(RecordBatch::try_new(
        songs_schema(),
        vec![
            Arc::new(song_id.finish()),
            Arc::new(title.finish()),
            Arc::new(artist_id.finish()),
            Arc::new(year.finish()),
            Arc::new(duration.finish()),
        ],
    )?)
}

/// Project `{artist_id, artist_name, artist_location, artist_latitude, artist_longitude}`
pub fn artists_table(records: &[CatalogRecord], dedup: ArtistDedup) -> Result<RecordBatch> {
    let selected = select_artist_rows(records, dedup);

    let capacity = selected.len();
    let mut artist_id = StringBuilder::with_capacity(capacity, capacity * 18);
    let mut artist_name = StringBuilder::with_capacity(capacity, capacity * 24);
    let mut artist_location = StringBuilder::with_capacity(capacity, capacity * 24);
    let mut artist_latitude = Float64Builder::with_capacity(capacity);
    let mut artist_longitude = Float64Builder::with_capacity(capacity);

    for record in selected {
        artist_id.append_value(&record.artist_id);
        artist_name.append_value(&record.artist_name);
        artist_location.append_option(record.artist_location.as_deref());
        artist_latitude.append_option(record.artist_latitude);
        artist_longitude.append_option(record.artist_longitude);
    }

    Ok(RecordBatch::try_new(
        artists_schema(),
        vec![
            Arc::new(artist_id.finish()),
            Arc::new(artist_name.finish()),
            Arc::new(artist_location.finish()),
            Arc::new(artist_latitude.finish()),
            Arc::new(artist_longitude.finish()),
        ],
    )?)
}

fn select_artist_rows(records: &[CatalogRecord], dedup: ArtistDedup) -> Vec<&CatalogRecord> {
    match dedup {
        ArtistDedup::None => records.iter().collect(),
        ArtistDedup::FirstWins => {
            let mut seen = HashSet::new();
            records
                .iter()
                .filter(|&r| seen.insert(r.artist_id.as_str()))
                .collect()
        }
        ArtistDedup::LastWins => {
            let mut seen = HashSet::new();
            let mut kept: Vec<&CatalogRecord> = records
                .iter()
                .rev()
                .filter(|&r| seen.insert(r.artist_id.as_str()))
                .collect();
            kept.reverse();
            kept
        }
    }
}
