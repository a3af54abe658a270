//! Natural due-date phrases and list windows.
//!
//! Every phrase resolves to 09:00 local time on the chosen day:
//! `today`, `tomorrow`, weekday names or three-letter abbreviations (the next
//! such day strictly after today), `YYYY-MM-DD`, `MM/DD/YYYY`, and `Jan 2` /
//! `January 2` in the current year.

use crate::models::Priority;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, Days, Local, NaiveDate, TimeZone, Utc, Weekday};

/// Hour of day a parsed due date lands on.
pub const DUE_HOUR: u32 = 9;

/// Parse a due-date phrase relative to `now`.
pub fn parse_due(input: &str, now: DateTime<Local>) -> Result<DateTime<Utc>> {
    let phrase = input.trim().to_lowercase();
    let today = now.date_naive();

    let date = match phrase.as_str() {
        "today" => Some(today),
        "tomorrow" => today.checked_add_days(Days::new(1)),
        other => match parse_weekday(other) {
            Some(weekday) => Some(next_weekday(today, weekday)),
            None => parse_date(input.trim(), today.year()),
        },
    };

    date.and_then(|d| at_local(d, DUE_HOUR))
        .ok_or_else(|| Error::InvalidInput(format!("Could not parse due date: {}", input)))
}

/// Parse a priority word or number.
pub fn parse_priority(input: &str) -> Result<Priority> {
    Priority::parse(input).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Invalid priority '{}' (expected none, low, medium, high or 0-3)",
            input
        ))
    })
}

/// Day ranges for `list --today`, `--tomorrow` and `--week`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueWindow {
    Today,
    Tomorrow,
    Week,
}

impl DueWindow {
    /// `[start, end)` in UTC for this window, relative to local `now`.
    pub fn bounds(self, now: DateTime<Local>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let (from, days) = match self {
            DueWindow::Today => (today, 1),
            DueWindow::Tomorrow => (today.checked_add_days(Days::new(1))?, 1),
            DueWindow::Week => (today, 7),
        };
        let until = from.checked_add_days(Days::new(days))?;
        Some((at_local(from, 0)?, at_local(until, 0)?))
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    Some(match s {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    })
}

/// Next `weekday` strictly after `from`.
fn next_weekday(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = from.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut days = target - current;
    if days <= 0 {
        days += 7;
    }
    from + chrono::Duration::days(days)
}

fn parse_date(s: &str, year: i32) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    // Month-day phrases carry no year. "%B" parses full names and abbreviations.
    NaiveDate::parse_from_str(&format!("{} {}", s, year), "%B %d %Y").ok()
}

/// `date` at `hour`:00 local time, as UTC.
fn at_local(date: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|d| d.with_timezone(&Utc))
}
