// Epoch timestamp → calendar decomposition
//
// Activity `ts` values are epoch milliseconds. They are floored to whole
// seconds and then broken into calendar fields in a configurable zone.

use chrono::{DateTime, Datelike, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Zone used to read calendar fields off an instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    /// Host time zone
    #[default]
    Local,
    /// Fixed offset from UTC (UTC itself is offset zero)
    Fixed(FixedOffset),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid calendar zone '{0}': expected 'local', 'utc' or an offset like '+05:30'")]
pub struct ParseZoneError(pub String);

impl CalendarZone {
    pub fn utc() -> Self {
        CalendarZone::Fixed(Utc.fix())
    }

    /// Decompose whole epoch seconds into calendar fields.
    ///
    /// Returns `None` when the value is outside chrono's representable range.
    pub fn decompose(&self, epoch_seconds: i64) -> Option<CalendarParts> {
        let instant = DateTime::<Utc>::from_timestamp(epoch_seconds, 0)?;
        let parts = match self {
            CalendarZone::Local => parts_in(instant.with_timezone(&Local)),
            CalendarZone::Fixed(offset) => parts_in(instant.with_timezone(offset)),
        };
        Some(CalendarParts {
            start_time_micros: epoch_seconds.checked_mul(1_000_000)?,
            ..parts
        })
    }
}

impl FromStr for CalendarZone {
    type Err = ParseZoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(CalendarZone::Local),
            "utc" | "z" => return Ok(CalendarZone::utc()),
            _ => {}
        }
        parse_offset(trimmed)
            .map(CalendarZone::Fixed)
            .ok_or_else(|| ParseZoneError(s.to_string()))
    }
}

impl fmt::Display for CalendarZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarZone::Local => write!(f, "local"),
            CalendarZone::Fixed(offset) if offset.local_minus_utc() == 0 => write!(f, "utc"),
            CalendarZone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

// Accepts +HH:MM, -HH:MM, +HHMM and +HH.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Calendar fields of one `start_time`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarParts {
    /// The instant itself, microseconds since the epoch
    pub start_time_micros: i64,
    pub hour: i32,
    pub day: i32,
    /// ISO-8601 week of year
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// 1 = Sunday … 7 = Saturday
    pub weekday: i32,
}

fn parts_in<Tz: TimeZone>(dt: DateTime<Tz>) -> CalendarParts {
    CalendarParts {
        start_time_micros: 0,
        hour: dt.hour() as i32,
        day: dt.day() as i32,
        week: dt.iso_week().week() as i32,
        month: dt.month() as i32,
        year: dt.year(),
        weekday: dt.weekday().number_from_sunday() as i32,
    }
}

/// Floor epoch milliseconds to whole epoch seconds
pub fn epoch_millis_to_seconds(ts_millis: i64) -> i64 {
    ts_millis.div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_floor() {
        assert_eq!(epoch_millis_to_seconds(1_541_990_258_796), 1_541_990_258);
        assert_eq!(epoch_millis_to_seconds(1_000), 1);
        assert_eq!(epoch_millis_to_seconds(-1), -1);
    }

    #[test]
    fn test_decompose_utc() {
        // 2018-11-12 02:37:38 UTC, a Monday
        let parts = CalendarZone::utc().decompose(1_541_990_258).unwrap();
        assert_eq!(parts.start_time_micros, 1_541_990_258_000_000);
        assert_eq!(parts.year, 2018);
        assert_eq!(parts.month, 11);
        assert_eq!(parts.day, 12);
        assert_eq!(parts.hour, 2);
        assert_eq!(parts.week, 46);
        assert_eq!(parts.weekday, 2);
    }

    #[test]
    fn test_decompose_fixed_offset_crosses_midnight() {
        let zone: CalendarZone = "-05:00".parse().unwrap();
        let parts = zone.decompose(1_541_990_258).unwrap();
        assert_eq!(parts.day, 11);
        assert_eq!(parts.hour, 21);
        assert_eq!(parts.weekday, 1);
        // The instant does not move with the zone
        assert_eq!(parts.start_time_micros, 1_541_990_258_000_000);
    }

    #[test]
    fn test_zone_parsing() {
        assert_eq!("local".parse::<CalendarZone>().unwrap(), CalendarZone::Local);
        assert_eq!("UTC".parse::<CalendarZone>().unwrap(), CalendarZone::utc());
        assert_eq!(
            "+0530".parse::<CalendarZone>().unwrap(),
            CalendarZone::Fixed(FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap())
        );
        assert_eq!("+05".parse::<CalendarZone>().unwrap().to_string(), "+05:00");
        assert!("Europe/Paris".parse::<CalendarZone>().is_err());
        assert!("+05:75".parse::<CalendarZone>().is_err());
        assert!("+5".parse::<CalendarZone>().is_err());
    }
}
