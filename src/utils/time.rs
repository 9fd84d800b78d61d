use crate::error::{Error, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d %Y",
    "%d %B %Y",
];

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Formats a naive date-time the way the calendar API expects it (no offset).
pub fn to_calendar_string(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

fn weekday_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("valid regex")
    })
}

fn ordinal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})(?:[:.](\d{2}))?(?::(\d{2}))?\s*(?:([ap])\.?\s*m?\.?)?$")
            .expect("valid regex")
    })
}

/// Parses the free-form date the agent or the completion model produced.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }

    let without_weekday = weekday_prefix_re().replace(trimmed, "");
    let without_ordinals = ordinal_re().replace_all(&without_weekday, "$1");
    let cleaned = without_ordinals
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .ok_or_else(|| Error::BadRequest(format!("Unrecognized date: {}", input)))
}

/// Parses 12-hour (`10:30 AM`, `4pm`, `9 a.m.`) and 24-hour (`14:05`) clock times.
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let invalid = || Error::BadRequest(format!("Unrecognized time: {}", input));
    let lowered = input.trim().to_lowercase();
    match lowered.as_str() {
        "noon" => return NaiveTime::from_hms_opt(12, 0, 0).ok_or_else(invalid),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(invalid),
        _ => {}
    }

    let caps = time_re().captures(&lowered).ok_or_else(invalid)?;

    let hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().map_err(|_| invalid())?,
        None => 0,
    };
    let second: u32 = match caps.get(3) {
        Some(s) => s.as_str().parse().map_err(|_| invalid())?,
        None => 0,
    };

    let hour = match caps.get(4).map(|m| m.as_str()) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return Err(invalid());
            }
            let base = hour % 12;
            if meridiem == "p" {
                base + 12
            } else {
                base
            }
        }
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)
}

pub fn parse_meeting_datetime(date: &str, time: &str, today: NaiveDate) -> Result<NaiveDateTime> {
    let date = parse_date(date, today)?;
    let time = parse_time(time)?;
    Ok(date.and_time(time))
}
