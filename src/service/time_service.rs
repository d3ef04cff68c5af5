use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use thiserror::Error;

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unparseable timestamp {input:?}")]
pub struct TimeParseError {
    pub input: String,
}

/// The timezone whose wall clock decides what "today" and "tomorrow" mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Named(Tz),
}

impl Zone {
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(Zone::Named)
    }

    pub fn wall_clock<O: TimeZone>(&self, instant: &DateTime<O>) -> NaiveDateTime {
        match self {
            Zone::Local => instant.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    pub fn day_of<O: TimeZone>(&self, instant: &DateTime<O>) -> NaiveDate {
        self.wall_clock(instant).date()
    }

    /// First instant of `day` in this zone. When midnight falls in a DST gap
    /// the first valid wall-clock hour is used.
    pub fn start_of_day(&self, day: NaiveDate) -> Option<DateTime<Utc>> {
        (0..3).find_map(|hour| {
            let local = day.and_time(NaiveTime::MIN) + Duration::hours(hour);
            match self {
                Zone::Local => Local
                    .from_local_datetime(&local)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc)),
                Zone::Named(tz) => tz
                    .from_local_datetime(&local)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc)),
            }
        })
    }
}

/// A Notion date value: either a bare calendar day or a full timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Day(NaiveDate),
    Instant(DateTime<FixedOffset>),
}

impl DateValue {
    /// Tries the calendar-day form first, then RFC 3339 with optional
    /// fractional seconds.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(day) = NaiveDate::parse_from_str(value, DAY_FORMAT) {
            return Some(DateValue::Day(day));
        }
        parse_instant(value).map(DateValue::Instant)
    }

    pub fn local_day(&self, zone: Zone) -> NaiveDate {
        match self {
            DateValue::Day(day) => *day,
            DateValue::Instant(instant) => zone.day_of(instant),
        }
    }

    pub fn earliest_instant(&self, zone: Zone) -> Option<DateTime<Utc>> {
        match self {
            DateValue::Day(day) => zone.start_of_day(*day),
            DateValue::Instant(instant) => Some(instant.with_timezone(&Utc)),
        }
    }
}

pub fn parse_instant(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value.trim()).ok()
}

/// Turns wire timestamps into the `YYYY-MM-DD HH:MM:SS` display form.
#[derive(Debug, Clone, Copy)]
pub struct TimeParser {
    zone: Zone,
}

impl TimeParser {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }

    /// Empty input means "no value" and yields an empty string. A bare
    /// calendar day is rendered without a time part.
    pub fn format_timestamp(&self, value: &str) -> Result<String, TimeParseError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }
        match DateValue::parse(trimmed) {
            Some(DateValue::Instant(instant)) => {
                Ok(self.zone.wall_clock(&instant).format(DISPLAY_FORMAT).to_string())
            }
            Some(DateValue::Day(day)) => Ok(day.format(DAY_FORMAT).to_string()),
            None => Err(TimeParseError {
                input: value.to_string(),
            }),
        }
    }
}
