// crates/core/src/schedule.rs

//! Textual date/time helpers.
//!
//! Event values travel through the pipeline as text. These helpers re-parse
//! them where a stage needs arithmetic (end time) or a friendlier rendering.

use chrono::{Duration, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*-?\s*([a-z]+)")
        .expect("duration pattern is valid")
});

/// Longest duration we are willing to do arithmetic with.
const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// Minutes per unit word, or `None` for words that are not a duration unit.
fn unit_minutes(unit: &str) -> Option<f64> {
    match unit.to_ascii_lowercase().as_str() {
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(60.0),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(1.0),
        _ => None,
    }
}

/// Parse phrases like "2 hours", "30 minutes", "1.5 hours",
/// "1 hour 30 minutes", "90 min", "2-hour" or "1h30m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let mut minutes = 0.0_f64;
    let mut matched = false;

    for cap in DURATION_PART.captures_iter(s) {
        let per_unit = match unit_minutes(&cap[2]) {
            Some(m) => m,
            None => continue,
        };
        let amount: f64 = cap[1].parse().ok()?;
        minutes += amount * per_unit;
        matched = true;
    }

    let minutes = minutes.round() as i64;
    if !matched || minutes <= 0 || minutes > MAX_DURATION_MINUTES {
        return None;
    }
    Some(Duration::minutes(minutes))
}

/// Add a duration to a clock time, wrapping past midnight.
pub fn add_duration(start: NaiveTime, duration: Duration) -> NaiveTime {
    start.overflowing_add_signed(duration).0
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// "08:00" -> "8:00 AM". Returns the input unchanged when it does not parse.
pub fn to_12_hour(s: &str) -> String {
    match parse_time(s) {
        Some(t) => t.format("%-I:%M %p").to_string(),
        None => s.to_string(),
    }
}

/// "2025-08-22" -> "August 22, 2025". Returns the input unchanged when it does not parse.
pub fn human_date(s: &str) -> String {
    match parse_date(s) {
        Some(d) => d.format("%B %-d, %Y").to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(parse_duration("2 hours"), Some(Duration::minutes(120)));
        assert_eq!(parse_duration("30 minutes"), Some(Duration::minutes(30)));
        assert_eq!(parse_duration("1.5 hours"), Some(Duration::minutes(90)));
        assert_eq!(
            parse_duration("1 hour 30 minutes"),
            Some(Duration::minutes(90))
        );
        assert_eq!(parse_duration("90 min"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("1h30m"), Some(Duration::minutes(90)));
        assert_eq!(parse_duration("2-hour"), Some(Duration::minutes(120)));
        assert_eq!(parse_duration("45mins"), Some(Duration::minutes(45)));
        assert_eq!(parse_duration("2 months"), None);
        assert_eq!(parse_duration("all day"), None);
        assert_eq!(parse_duration("0 minutes"), None);
    }

    #[test]
    fn end_time_wraps_midnight() {
        let start = parse_time("23:30").unwrap();
        let end = add_duration(start, Duration::minutes(60));
        assert_eq!(format_time(end), "00:30");
    }

    #[test]
    fn renders_for_humans() {
        assert_eq!(to_12_hour("08:00"), "8:00 AM");
        assert_eq!(to_12_hour("14:30"), "2:30 PM");
        assert_eq!(to_12_hour("soon"), "soon");
        assert_eq!(human_date("2025-08-22"), "August 22, 2025");
        assert_eq!(human_date("next week"), "next week");
    }

    #[test]
    fn times_accept_seconds() {
        assert!(parse_time("08:00:00").is_some());
        assert!(parse_time("8am").is_none());
    }
}
