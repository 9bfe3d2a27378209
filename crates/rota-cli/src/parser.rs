use chrono::{NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_english::{parse_date_string, Dialect};
use rota_core::calendar;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Failed to parse date '{0}': {1}")]
    Date(String, String),
    #[error("Invalid time '{0}', expected HH:MM")]
    Time(String),
    #[error("Invalid weekday '{0}', expected mon, tue, ... or monday, tuesday, ...")]
    Weekday(String),
}

/// Parses `YYYY-MM-DD` or a natural-language date ("tomorrow", "next friday")
/// relative to `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let input = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    match input.to_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today.pred_opt().unwrap_or(today)),
        _ => {}
    }

    let base = Utc.from_utc_datetime(&today.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN)));
    parse_date_string(input, base, Dialect::Uk)
        .map(|dt| dt.date_naive())
        .map_err(|e| ParseError::Date(input.to_string(), e.to_string()))
}

/// Parses a date and returns the Monday of its week.
pub fn parse_week(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, ParseError> {
    let date = input.map(|s| parse_date(s, today)).transpose()?.unwrap_or(today);
    Ok(calendar::week_start_of(date))
}

pub fn parse_time(input: &str) -> Result<NaiveTime, ParseError> {
    calendar::parse_clock_time(input.trim()).map_err(|_| ParseError::Time(input.to_string()))
}

/// Weekday name to the stored day-of-week number (`0 = Sunday`).
pub fn parse_weekday(input: &str) -> Result<u8, ParseError> {
    input
        .trim()
        .parse::<Weekday>()
        .map(|day| day.num_days_from_sunday() as u8)
        .map_err(|_| ParseError::Weekday(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    #[rstest]
    #[case("2025-08-19", "2025-08-19")]
    #[case("today", "2025-08-20")]
    #[case("tomorrow", "2025-08-21")]
    #[case("yesterday", "2025-08-19")]
    fn test_parse_date(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_date(input, today()).unwrap().to_string(), expected);
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(parse_date("not-a-date", today()), Err(ParseError::Date(..))));
    }

    #[test]
    fn test_parse_week_normalizes_to_monday() {
        assert_eq!(parse_week(None, today()).unwrap().to_string(), "2025-08-18");
        assert_eq!(parse_week(Some("2025-08-24"), today()).unwrap().to_string(), "2025-08-18");
    }

    #[rstest]
    #[case("sun", 0)]
    #[case("Monday", 1)]
    #[case("sat", 6)]
    fn test_parse_weekday(#[case] input: &str, #[case] expected: u8) {
        assert_eq!(parse_weekday(input), Ok(expected));
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("18:30"), Ok(NaiveTime::from_hms_opt(18, 30, 0).unwrap()));
        assert_eq!(parse_time("6pm"), Err(ParseError::Time("6pm".into())));
    }
}
