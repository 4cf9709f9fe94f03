//! Live badge and relative-age labels for feed timestamps.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Serialize;

/// Updates younger than this show the live badge.
const LIVE_WINDOW_MINUTES: i64 = 5;

/// How fresh an entity's timestamp is at a given moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Freshness {
    /// Human label such as `"12 minutes ago"`; `None` if the timestamp is missing or unreadable.
    pub age: Option<String>,
    /// Updated within the last five minutes.
    pub live: bool,
}

impl Freshness {
    /// Assess a raw feed timestamp against `now`.
    pub fn assess(timestamp: Option<&str>, now: DateTime<Utc>) -> Self {
        let Some(at) = timestamp.and_then(parse_timestamp) else {
            return Self { age: None, live: false };
        };
        return Self {
            age: Some(relative_age(at, now)),
            live: is_live(at, now),
        };
    }
}

/// Whether `at` lies within the live window before `now`. Future timestamps are live.
pub fn is_live(at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    return now.signed_duration_since(at) <= TimeDelta::minutes(LIVE_WINDOW_MINUTES);
}

/// Read an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS` one taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    return NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| return NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| return naive.and_utc());
}

/// `"Just now"`, `"N minutes ago"`, `"N hours ago"` or `"N days ago"`,
/// singular for one.
pub fn relative_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }
    return plural(elapsed.num_days(), "day");
}

/// `"1 hour ago"` / `"3 hours ago"`.
fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        return format!("1 {unit} ago");
    }
    return format!("{count} {unit}s ago");
}
