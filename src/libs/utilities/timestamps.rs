use chrono::{DateTime, Duration, Utc};

/// Current UTC time in RFC 3339 format, as stored in `state.json`.
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Time elapsed since an RFC 3339 timestamp, or `None` if it does not parse.
pub fn time_since(timestamp: &str) -> Option<Duration> {
    let then = DateTime::parse_from_rfc3339(timestamp).ok()?;
    Some(Utc::now().signed_duration_since(then.with_timezone(&Utc)))
}

/// Human-readable form of `duration` using its largest whole unit.
pub fn format_duration(duration: &Duration) -> String {
    if duration.num_days() > 0 {
        format!("{} days", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{} hours", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{} minutes", duration.num_minutes())
    } else {
        "less than a minute".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_use_largest_unit() {
        assert_eq!(format_duration(&Duration::days(3)), "3 days");
        assert_eq!(format_duration(&Duration::hours(5)), "5 hours");
        assert_eq!(format_duration(&Duration::minutes(42)), "42 minutes");
        assert_eq!(format_duration(&Duration::seconds(10)), "less than a minute");
    }

    #[test]
    fn time_since_parses_our_own_timestamps() {
        let elapsed = time_since(&current_timestamp()).unwrap();
        assert!(elapsed.num_minutes() < 1);
        assert!(time_since("yesterday").is_none());
    }
}
