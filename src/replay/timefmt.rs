//! Wall-clock and duration formatting for cue times.
//!
//! Cue times are seconds relative to the session start; the session is an
//! epoch timestamp in milliseconds. All wall-clock values are UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use super::share_token::parse_float_prefix;

const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// `m:ss`, or `h:mm:ss` once the duration reaches an hour
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// `HH:MM:SS` of the instant `seconds` after the session start
pub fn format_wallclock(seconds: f64, session: u64) -> String {
    match instant(seconds, session) {
        Some(at) => at.format("%H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// ISO-8601 UTC string with millisecond precision (`2023-11-14T22:13:20.000Z`)
pub fn iso_instant(seconds: f64, session: u64) -> Option<String> {
    instant(seconds, session).map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn instant(seconds: f64, session: u64) -> Option<DateTime<Utc>> {
    let ms = (seconds * 1000.0 + session as f64).round();
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64)
}

/// Parse a wall-clock string into epoch milliseconds.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` values
/// (read as UTC) and bare dates (midnight UTC).
pub fn parse_wall_clock_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp_millis())
}

/// Seconds between the session start and a wall-clock string
pub fn session_offset(raw: &str, session: u64) -> Option<f64> {
    let ms = parse_wall_clock_ms(raw)?;
    let session = i64::try_from(session).ok()?;
    Some(ms.checked_sub(session)? as f64 / 1000.0)
}

/// Turn an edited `HH:MM:SS` time of day into a cue offset.
///
/// The time of day replaces the one of the session's date, keeping the
/// session's millisecond component. Out-of-range fields roll over like
/// calendar arithmetic. Times before the session start yield `None`.
pub fn parse_wallclock_edit(text: &str, session: u64) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return None;
    };

    let hours = parse_float_prefix(hours)?.trunc() as i64;
    let minutes = parse_float_prefix(minutes)?.trunc() as i64;
    let seconds = parse_float_prefix(seconds)?.trunc() as i64;

    let session_ms = i64::try_from(session).ok()?;
    let day_start = session_ms - session_ms.rem_euclid(MS_PER_DAY);
    let millis = session_ms.rem_euclid(1000);

    let edited = hours
        .checked_mul(MS_PER_HOUR)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1000)?)?
        .checked_add(day_start)?
        .checked_add(millis)?;
    let offset = edited.checked_sub(session_ms)?;

    (offset >= 0).then(|| offset as f64 / 1000.0)
}
