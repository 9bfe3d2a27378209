use std::str::FromStr;

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use rota_core::error::CoreError;
use rota_core::sync::Clock;

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| {
        CoreError::InvalidInput(format!(
            "Invalid timezone: '{}'. Use IANA timezone names like 'Europe/Berlin'",
            timezone
        ))
    })
}

/// Detect system timezone
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

fn common_timezones() -> &'static [&'static str] {
    &[
        "UTC",
        "America/New_York",
        "America/Chicago",
        "America/Denver",
        "America/Los_Angeles",
        "America/Sao_Paulo",
        "Europe/London",
        "Europe/Paris",
        "Europe/Berlin",
        "Europe/Madrid",
        "Europe/Stockholm",
        "Asia/Tokyo",
        "Asia/Shanghai",
        "Asia/Kolkata",
        "Asia/Dubai",
        "Australia/Sydney",
        "Pacific/Auckland",
    ]
}

/// Suggest similar timezones for invalid input
pub fn suggest_timezone(invalid: &str) -> Vec<&'static str> {
    let invalid_lower = invalid.to_lowercase();
    let mut matches: Vec<&'static str> = common_timezones()
        .iter()
        .copied()
        .filter(|tz| {
            tz.split('/')
                .any(|part| part.to_lowercase().contains(&invalid_lower))
        })
        .collect();
    matches.truncate(5);
    matches
}

/// Accepts IANA names plus a few common abbreviations.
pub fn normalize_timezone_input(input: &str) -> Result<Tz, CoreError> {
    if let Ok(tz) = validate_timezone(input) {
        return Ok(tz);
    }

    let normalized = match input.to_lowercase().as_str() {
        "est" | "eastern" => "America/New_York",
        "cst" | "central" => "America/Chicago",
        "mst" | "mountain" => "America/Denver",
        "pst" | "pacific" => "America/Los_Angeles",
        "gmt" | "utc" => "UTC",
        "bst" | "london" => "Europe/London",
        "cet" | "paris" => "Europe/Paris",
        "jst" | "tokyo" => "Asia/Tokyo",
        _ => {
            let suggestions = suggest_timezone(input);
            let hint = if suggestions.is_empty() {
                "Use standard IANA names like 'Europe/Berlin'".to_string()
            } else {
                format!("Did you mean: {}?", suggestions.join(", "))
            };
            return Err(CoreError::InvalidInput(format!(
                "Unknown timezone '{}'. {}",
                input, hint
            )));
        }
    };

    validate_timezone(normalized)
}

/// Wall clock of the household's timezone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Clock for ZonedClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.tz).naive_local()
    }
}
