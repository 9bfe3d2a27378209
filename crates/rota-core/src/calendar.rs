//! Calendar conventions shared by the stores and the engine.
//!
//! Two weekday numberings meet here and nowhere else:
//!
//! - **Storage numbering** (`WeekTemplateDay::day_of_week`): `0 = Sunday` …
//!   `6 = Saturday`, the calendar `getDay()` convention.
//! - **Week layout**: weeks start on Monday (ISO), so `week_dates()[0]` is a
//!   Monday and `week_dates()[6]` a Sunday.
//!
//! Every conversion between the two goes through [`day_of_week`] and
//! [`weekday_from_day_of_week`].

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};

use crate::error::CoreError;

pub const DAYS_PER_WEEK: usize = 7;
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Returns the Monday of the ISO week containing `date`.
pub fn week_start_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

#[inline]
pub fn is_week_start(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

/// Rejects week keys that are not Mondays.
pub fn validate_week_start(date: NaiveDate) -> Result<(), CoreError> {
    if is_week_start(date) {
        Ok(())
    } else {
        Err(CoreError::InvalidInput(format!(
            "Week start {} is a {}, expected a Monday",
            date,
            date.weekday()
        )))
    }
}

/// The seven calendar dates of the week starting at `week_start`, Monday first.
pub fn week_dates(week_start: NaiveDate) -> [NaiveDate; DAYS_PER_WEEK] {
    let mut dates = [week_start; DAYS_PER_WEEK];
    for (offset, slot) in dates.iter_mut().enumerate() {
        *slot = week_start + Duration::days(offset as i64);
    }
    dates
}

#[inline]
pub fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(DAYS_PER_WEEK as i64 - 1)
}

#[inline]
pub fn is_within_week(week_start: NaiveDate, date: NaiveDate) -> bool {
    date >= week_start && date <= week_end(week_start)
}

#[inline]
pub fn shift_weeks(week_start: NaiveDate, weeks: i64) -> NaiveDate {
    week_start + Duration::weeks(weeks)
}

/// Storage weekday number for `date` (`0 = Sunday`).
#[inline]
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Inverse of [`day_of_week`]; `None` outside `0..=6`.
pub fn weekday_from_day_of_week(day_of_week: u8) -> Option<Weekday> {
    match day_of_week {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Parity of a week, derived from the ISO week number of its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekParity {
    Even,
    Odd,
}

/// ISO week number of `week_start` mod 2. Note that a 53-week ISO year is
/// followed by week 1, so two odd weeks can be adjacent at a year boundary.
pub fn week_parity(week_start: NaiveDate) -> WeekParity {
    if week_start.iso_week().week() % 2 == 0 {
        WeekParity::Even
    } else {
        WeekParity::Odd
    }
}

/// The `count` week starts ending at (and including) the week of `anchor`,
/// oldest first.
pub fn trailing_week_starts(anchor: NaiveDate, count: u32) -> Vec<NaiveDate> {
    let last = week_start_of(anchor);
    (0..i64::from(count))
        .rev()
        .map(|back| shift_weeks(last, -back))
        .collect()
}

/// Parses a strict 24h `HH:MM` clock time.
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, CoreError> {
    let trimmed = value.trim();
    let well_formed = trimmed.len() == 5
        && trimmed.as_bytes()[2] == b':'
        && trimmed
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !well_formed {
        return Err(CoreError::InvalidInput(format!(
            "Invalid time '{}': expected HH:MM (24h)",
            value
        )));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| CoreError::InvalidInput(format!("Invalid time '{}': out of range", value)))
}

#[inline]
pub fn format_clock_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[inline]
pub fn minute_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Formats a minute offset from the start of a day. Offsets past midnight
/// wrap and carry a `+Nd` marker, e.g. `1470` → `"00:30+1d"`.
pub fn format_minute_of_day(minutes: i64) -> String {
    let days = minutes.div_euclid(MINUTES_PER_DAY);
    let within = minutes.rem_euclid(MINUTES_PER_DAY);
    let label = format!("{:02}:{:02}", within / 60, within % 60);
    if days == 0 {
        label
    } else {
        format!("{}{:+}d", label, days)
    }
}

/// Serde adapter for `NaiveTime` as `"HH:MM"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_clock_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_clock_time(&raw).map_err(serde::de::Error::custom)
    }

    /// Same as the parent module, for `Option<NaiveTime>`.
    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.serialize_some(&super::super::format_clock_time(*time)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| super::super::parse_clock_time(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}
