//! Pure time helpers: session-id bucketing and human-readable formatting.
//!
//! Everything here takes `now` explicitly so output is deterministic under test.

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TimeOfDay
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Before 12:00 is morning, 12:00 to 16:59 afternoon, the rest evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            _ => TimeOfDay::Evening,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `YYYY-MM-DD-<bucket>` for the wall-clock time of `at` in `offset`.
pub fn session_id_for(at: DateTime<Utc>, offset: FixedOffset) -> String {
    let local = at.with_timezone(&offset);
    format!(
        "{}-{}",
        local.format("%Y-%m-%d"),
        TimeOfDay::from_hour(local.hour())
    )
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// `"2h 5m"` when at least an hour has elapsed, otherwise `"5m"`.
pub fn format_duration(elapsed: Duration) -> String {
    let minutes_total = elapsed.num_minutes().max(0);
    let hours = minutes_total / 60;
    let minutes = minutes_total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// `"just now"`, `"3 minutes ago"`, `"1 hour ago"`, `"2 days ago"`.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - then;
    let mins = diff.num_minutes();
    let hours = diff.num_hours();
    let days = diff.num_days();

    if mins < 1 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{mins} minute{} ago", plural(mins))
    } else if hours < 24 {
        format!("{hours} hour{} ago", plural(hours))
    } else {
        format!("{days} day{} ago", plural(days))
    }
}

/// Countdown shown next to a session's expiry time.
pub fn format_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if expires_at <= now {
        return "expired".to_string();
    }
    let hours = (expires_at - now).num_hours();
    if hours > 0 {
        format!("{hours}h remaining")
    } else {
        "Expiring soon!".to_string()
    }
}

pub fn format_date(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string()
}

/// Cut `s` to at most `max` characters, ending in `...` when shortened.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn utc_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn buckets() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(16), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Evening);
    }

    #[test]
    fn session_id_uses_offset() {
        let at = utc(2024, 1, 1, 9, 0);
        assert_eq!(session_id_for(at, utc_offset()), "2024-01-01-morning");

        // 09:00Z is 18:00 in UTC+9
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(session_id_for(at, tokyo), "2024-01-01-evening");

        // 02:00Z is the previous evening in UTC-8
        let pst = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(
            session_id_for(utc(2024, 1, 2, 2, 0), pst),
            "2024-01-01-evening"
        );
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::minutes(5)), "5m");
        assert_eq!(format_duration(Duration::minutes(125)), "2h 5m");
        assert_eq!(format_duration(Duration::minutes(-3)), "0m");
    }

    #[test]
    fn relative_times() {
        let now = utc(2024, 1, 3, 12, 0);
        assert_eq!(format_relative(now, now), "just now");
        assert_eq!(format_relative(utc(2024, 1, 3, 11, 59), now), "1 minute ago");
        assert_eq!(format_relative(utc(2024, 1, 3, 11, 30), now), "30 minutes ago");
        assert_eq!(format_relative(utc(2024, 1, 3, 10, 0), now), "2 hours ago");
        assert_eq!(format_relative(utc(2024, 1, 2, 12, 0), now), "1 day ago");
        assert_eq!(format_relative(utc(2024, 1, 1, 0, 0), now), "2 days ago");
    }

    #[test]
    fn expiry_countdown() {
        let now = utc(2024, 1, 1, 9, 0);
        assert_eq!(format_expiry(utc(2024, 1, 2, 9, 0), now), "24h remaining");
        assert_eq!(format_expiry(utc(2024, 1, 1, 9, 30), now), "Expiring soon!");
        assert_eq!(format_expiry(now, now), "expired");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 10), "abcdefg...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn date_format() {
        assert_eq!(
            format_date(utc(2024, 1, 1, 9, 5), utc_offset()),
            "2024-01-01 09:05"
        );
    }
}
