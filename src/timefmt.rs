//! Timestamp Formatter.
//!
//! Human-relative age strings for display. Buckets: same calendar day uses
//! seconds/minutes/hours, under 30 days uses days, under 12 thirty-day
//! months uses months, everything older uses years. Never used for sorting.

use chrono::{DateTime, Utc};

/// Formats how long ago `then` was, as seen from `now`.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let months = days / 30;
    let years = days / 365;

    if then.date_naive() == now.date_naive() {
        if minutes == 0 {
            return format!("{} seconds ago", seconds);
        }
        if hours == 0 {
            return format!("{} minutes ago", minutes);
        }
        return format!("{} hours ago", hours);
    }

    if days < 30 {
        return format!("{} days ago", days);
    }
    if months < 12 {
        return format!("{} month(s) ago", months);
    }
    format!("{} year(s) ago", years)
}

/// Display fallback for a missing or blank author. Stored entities always
/// carry an author; this guards the presentation boundary only.
pub fn display_author(author: &str) -> &str {
    if author.trim().is_empty() {
        "Anonymous"
    } else {
        author
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn same_day_buckets() {
        let then = at(2022, 2, 9, 9, 20, 22);
        assert_eq!(relative_age(then, at(2022, 2, 9, 9, 20, 58)), "36 seconds ago");
        assert_eq!(relative_age(then, at(2022, 2, 9, 9, 25, 58)), "5 minutes ago");
        assert_eq!(relative_age(then, at(2022, 2, 9, 11, 30, 21)), "2 hours ago");
    }

    #[test]
    fn crossing_midnight_switches_to_days() {
        let then = at(2022, 2, 9, 23, 50, 0);
        // Under an hour apart but no longer the same calendar day.
        assert_eq!(relative_age(then, at(2022, 2, 10, 0, 10, 0)), "0 days ago");
    }

    #[test]
    fn days_months_years_buckets() {
        let then = at(2022, 2, 9, 9, 20, 22);
        assert_eq!(relative_age(then, at(2022, 2, 14, 9, 20, 22)), "5 days ago");
        assert_eq!(relative_age(then, at(2022, 3, 31, 9, 20, 58)), "1 month(s) ago");
        assert_eq!(relative_age(then, at(2023, 3, 31, 9, 20, 58)), "1 year(s) ago");
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        let then = at(2022, 2, 9, 10, 0, 0);
        assert_eq!(relative_age(then, at(2022, 2, 9, 9, 0, 0)), "0 seconds ago");
    }

    #[test]
    fn anonymous_fallback() {
        assert_eq!(display_author(""), "Anonymous");
        assert_eq!(display_author("   "), "Anonymous");
        assert_eq!(display_author("alice"), "alice");
    }
}
