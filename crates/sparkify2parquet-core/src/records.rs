// Source record models and newline-delimited JSON decoding
//
// Catalog files hold one song per file, activity files hold one event per
// line. Both are read as JSON lines so a one-object file is just the
// single-line case.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Page value marking an activity event as a song play
pub const SONG_PLAY_PAGE: &str = "NextSong";

/// One song from the catalog ("song_data")
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    /// 0 when the release year is unknown
    #[serde(default)]
    pub year: i32,
    pub duration: f64,
}

/// Subscription tier carried on every activity event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }
}

/// Where a record was read from, kept for error reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOrigin {
    pub path: Arc<str>,
    pub line: usize,
}

/// Un-coerced `ts` value; coercion happens during timestamp derivation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawTimestamp(pub Value);

impl RawTimestamp {
    /// Epoch milliseconds, or `None` when the value is not numeric.
    ///
    /// Floats and numeric strings are accepted and truncated toward zero.
    pub fn epoch_millis(&self) -> Option<i64> {
        match &self.0 {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(f64_to_i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(f64_to_i64))
            }
            _ => None,
        }
    }
}

fn f64_to_i64(v: f64) -> Option<i64> {
    if v.is_finite() && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        Some(v.trunc() as i64)
    } else {
        None
    }
}

/// One application event from the activity log ("log_data")
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub ts: RawTimestamp,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<Level>,
    pub page: String,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    #[serde(skip)]
    pub origin: RecordOrigin,
}

impl ActivityRecord {
    /// Whether this event represents a song play
    pub fn is_song_play(&self) -> bool {
        self.page == SONG_PLAY_PAGE
    }
}

// Raw logs carry userId both as "39" and as 39.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// Decode catalog records from one source file
pub fn parse_catalog_records(path: &str, bytes: &[u8]) -> Result<Vec<CatalogRecord>> {
    Ok(parse_json_lines(path, bytes)?
        .into_iter()
        .map(|(_, record)| record)
        .collect())
}

/// Decode activity records from one source file, tagging each with its origin
pub fn parse_activity_records(path: &str, bytes: &[u8]) -> Result<Vec<ActivityRecord>> {
    let origin_path: Arc<str> = Arc::from(path);
    Ok(parse_json_lines::<ActivityRecord>(path, bytes)?
        .into_iter()
        .map(|(line, mut record)| {
            record.origin = RecordOrigin {
                path: Arc::clone(&origin_path),
                line,
            };
            record
        })
        .collect())
}

fn parse_json_lines<T: DeserializeOwned>(path: &str, bytes: &[u8]) -> Result<Vec<(usize, T)>> {
    let mut records = Vec::new();

    for (idx, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let record = serde_json::from_slice::<T>(line).map_err(|e| Error::MalformedRecord {
            path: path.to_string(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        records.push((idx + 1, record));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SONG: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    const EVENT: &str = r#"{"artist":"Des'ree","auth":"Logged In","firstName":"Kaylee","gender":"F","itemInSession":1,"lastName":"Summers","length":246.30812,"level":"free","location":"Phoenix-Mesa-Scottsdale, AZ","method":"PUT","page":"NextSong","registration":1540344794796.0,"sessionId":139,"song":"You Gotta Be","status":200,"ts":1541106106796,"userAgent":"Mozilla/5.0","userId":"8"}"#;

    #[test]
    fn test_parse_catalog_record() {
        let records = parse_catalog_records("song_data/A/A/A/x.json", SONG.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let song = &records[0];
        assert_eq!(song.song_id, "SOMZWCG12A8C13C480");
        assert_eq!(song.artist_name, "Casual");
        assert_eq!(song.artist_location.as_deref(), Some("California - LA"));
        assert_eq!(song.artist_latitude, None);
        assert_eq!(song.year, 0);
    }

    #[test]
    fn test_parse_activity_lines_skips_blank_lines() {
        let payload = format!("{}\n\n{}\r\n", EVENT, EVENT.replace("\"8\"", "9"));
        let records = parse_activity_records("log_data/day.json", payload.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id.as_deref(), Some("8"));
        assert_eq!(records[1].user_id.as_deref(), Some("9"));
        assert_eq!(records[0].level, Some(Level::Free));
        assert_eq!(records[0].session_id, 139);
        assert_eq!(records[1].origin.line, 3);
        assert_eq!(&*records[1].origin.path, "log_data/day.json");
        assert!(records[0].is_song_play());
    }

    #[test]
    fn test_malformed_line_reports_location() {
        let payload = format!("{}\n{{\"page\": \"Home\"", EVENT);
        let err = parse_activity_records("log_data/bad.json", payload.as_bytes()).unwrap_err();
        match err {
            Error::MalformedRecord { path, line, .. } => {
                assert_eq!(path, "log_data/bad.json");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_raw_timestamp_coercion() {
        assert_eq!(
            RawTimestamp(serde_json::json!(1541990258796_i64)).epoch_millis(),
            Some(1541990258796)
        );
        assert_eq!(
            RawTimestamp(serde_json::json!(1541990258796.9)).epoch_millis(),
            Some(1541990258796)
        );
        assert_eq!(
            RawTimestamp(serde_json::json!(" 1541990258796 ")).epoch_millis(),
            Some(1541990258796)
        );
        assert_eq!(RawTimestamp(serde_json::json!("soon")).epoch_millis(), None);
        assert_eq!(RawTimestamp(Value::Null).epoch_millis(), None);
    }
}
