//! Turns the date strings job boards print ("3 days ago", "Posted 2 weeks
//! ago", ISO timestamps) into absolute UTC timestamps.
//!
//! Each site exposes a different granularity, so parsing is keyed by
//! [`DateStyle`] rather than one universal pattern. Unrecognized input maps
//! to "now".

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

/// How a source formats its posting dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Day or hour granularity ("3 days ago", "5 hours ago").
    Indeed,
    /// Day, week or month granularity.
    Reed,
    /// Same rules as [`DateStyle::Reed`].
    Generic,
    /// Absolute timestamps from JSON APIs, with a relative-text fallback.
    Absolute,
}

static DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*day").unwrap());
static HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*hour").unwrap());
static DAY_WEEK_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(day|week|month)").unwrap());

/// Parse `raw` relative to the current time.
pub fn parse(raw: &str, style: DateStyle) -> DateTime<Utc> {
    parse_at(raw, style, Utc::now())
}

/// Parse `raw` relative to `now`.
pub fn parse_at(raw: &str, style: DateStyle, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return now;
    }

    let parsed = match style {
        DateStyle::Indeed => parse_day_or_hour(&text, now),
        DateStyle::Reed | DateStyle::Generic => parse_day_week_month(&text, now),
        DateStyle::Absolute => {
            parse_absolute(raw.trim()).or_else(|| parse_day_week_month(&text, now))
        }
    };
    parsed.unwrap_or(now)
}

fn parse_day_or_hour(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(days) = capture_number(&DAYS, text) {
        return now.checked_sub_signed(Duration::try_days(days)?);
    }
    let hours = capture_number(&HOURS, text)?;
    now.checked_sub_signed(Duration::try_hours(hours)?)
}

fn parse_day_week_month(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = DAY_WEEK_MONTH.captures(text)?;
    let value: u32 = caps[1].parse().ok()?;
    match &caps[2] {
        "day" => now.checked_sub_signed(Duration::try_days(value.into())?),
        "week" => now.checked_sub_signed(Duration::try_weeks(value.into())?),
        "month" => now.checked_sub_months(Months::new(value)),
        _ => None,
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<i64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_absolute(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
