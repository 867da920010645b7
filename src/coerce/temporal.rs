//! Date, datetime, time and timedelta converters

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::value::Value;

/// Date formats tried in order: ISO first, then day-first, then month-first
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

const TIME_FORMATS: [&str; 3] = ["%H:%M:%S%.f", "%H:%M", "%I:%M %p"];

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn from_timestamp(secs: f64) -> Option<NaiveDateTime> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.naive_utc())
}

pub(super) fn to_date(value: Value) -> Result<Value, String> {
    match value {
        Value::Date(_) => Ok(value),
        Value::DateTime(dt) => Ok(Value::Date(dt.date())),
        Value::Str(s) => {
            let trimmed = s.trim();
            parse_date(trimmed)
                .or_else(|| parse_datetime(trimmed).map(|dt| dt.date()))
                .map(Value::Date)
                .ok_or_else(|| format!("unrecognized date {:?}", s))
        }
        Value::Int(i) => from_timestamp(i as f64)
            .map(|dt| Value::Date(dt.date()))
            .ok_or_else(|| format!("timestamp {} out of range", i)),
        other => Err(format!("expected a date, got {}", other.type_name())),
    }
}

pub(super) fn to_datetime(value: Value) -> Result<Value, String> {
    match value {
        Value::DateTime(_) => Ok(value),
        Value::Date(d) => d
            .and_hms_opt(0, 0, 0)
            .map(Value::DateTime)
            .ok_or_else(|| format!("invalid date {}", d)),
        Value::Str(s) => parse_datetime(s.trim())
            .map(Value::DateTime)
            .ok_or_else(|| format!("unrecognized datetime {:?}", s)),
        Value::Int(i) => from_timestamp(i as f64)
            .map(Value::DateTime)
            .ok_or_else(|| format!("timestamp {} out of range", i)),
        Value::Float(f) => from_timestamp(f)
            .map(Value::DateTime)
            .ok_or_else(|| format!("timestamp {} out of range", f)),
        other => Err(format!("expected a datetime, got {}", other.type_name())),
    }
}

pub(super) fn to_time(value: Value) -> Result<Value, String> {
    match value {
        Value::Time(_) => Ok(value),
        Value::DateTime(dt) => Ok(Value::Time(dt.time())),
        Value::Str(s) => {
            let trimmed = s.trim();
            TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
                .or_else(|| parse_datetime(trimmed).map(|dt| dt.time()))
                .map(Value::Time)
                .ok_or_else(|| format!("unrecognized time {:?}", s))
        }
        other => Err(format!("expected a time, got {}", other.type_name())),
    }
}

pub(super) fn to_timedelta(value: Value) -> Result<Value, String> {
    match value {
        Value::TimeDelta(_) => Ok(value),
        Value::Int(i) => Duration::try_seconds(i)
            .map(Value::TimeDelta)
            .ok_or_else(|| format!("{} seconds is out of range", i)),
        Value::Float(f) => from_seconds(f)
            .map(Value::TimeDelta)
            .ok_or_else(|| format!("{} seconds is out of range", f)),
        Value::Str(s) => parse_timedelta(s.trim())
            .map(Value::TimeDelta)
            .ok_or_else(|| format!("unrecognized timedelta {:?}", s)),
        other => Err(format!("expected a timedelta, got {}", other.type_name())),
    }
}

/// Parses `[D day[s], ]H:MM:SS[.ffffff]` or a plain number of seconds
fn parse_timedelta(s: &str) -> Option<Duration> {
    if let Ok(secs) = s.parse::<f64>() {
        return from_seconds(secs);
    }

    let (days, clock) = match s.split_once(',') {
        Some((day_part, clock)) => {
            let count = day_part.trim().split_whitespace().next()?.parse::<i64>().ok()?;
            (count, clock.trim())
        }
        None => (0, s),
    };

    let mut parts = clock.split(':');
    let hours: i64 = parts.next()?.parse().ok()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(0..60).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    Duration::try_days(days)?
        .checked_add(&Duration::try_hours(hours)?)?
        .checked_add(&Duration::try_minutes(minutes)?)?
        .checked_add(&from_seconds(seconds)?)
}

/// Fractional seconds at microsecond precision, `None` when out of range
fn from_seconds(secs: f64) -> Option<Duration> {
    let micros = (secs * 1e6).round();
    (micros.is_finite() && micros.abs() < i64::MAX as f64).then(|| Duration::microseconds(micros as i64))
}
