use chrono::{DateTime, Duration, Local, Utc};

/// Percentage of `unlocked` out of `total`, rounded to the nearest integer
pub fn calculate_percentage(unlocked: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((unlocked as f64 / total as f64) * 100.0).round() as u32
}

/// Format a unix timestamp (seconds) as a local calendar date
pub fn format_unlock_date(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.with_timezone(&Local).format("%b %d, %Y").to_string(),
        None => "unknown".to_string(),
    }
}

/// Format an age as a short relative string ("just now", "5m ago", "2h ago", "3d ago")
pub fn format_age(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        // Negative ages come from clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        let remaining_mins = minutes % 60;
        if remaining_mins >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        let remaining_hours = (minutes % 1440) / 60;
        if remaining_hours >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
