//! Formatting helpers shared by the CLI and the dashboard.

use chrono::{DateTime, Utc};

/// Format a timestamp relative to `now` (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Render a 0-100 gauge as a fixed-width bar, e.g. `[#####-----]`.
pub fn gauge_bar(value: u8, width: usize) -> String {
    let filled = (usize::from(value.min(100)) * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Format a `std::time::Duration` as `"4m 10s"` / `"35s"`.
pub fn format_remaining(remaining: std::time::Duration) -> String {
    let secs = remaining.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap();
        assert_eq!(format_relative_time(now + Duration::seconds(5), now), "just now");
        assert_eq!(format_relative_time(now - Duration::seconds(30), now), "30s ago");
        assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(format_relative_time(now - Duration::days(30), now), "Apr 20");
    }

    #[test]
    fn test_gauge_bar() {
        assert_eq!(gauge_bar(0, 10), "[----------]");
        assert_eq!(gauge_bar(100, 10), "[##########]");
        assert_eq!(gauge_bar(45, 10), "[#####-----]");
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(std::time::Duration::from_secs(35)), "35s");
        assert_eq!(format_remaining(std::time::Duration::from_secs(250)), "4m 10s");
    }
}
