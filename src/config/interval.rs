//! Human-friendly delay strings ("90s", "3m", "1h", "500ms") used by the config file.

use std::time::Duration;

/// Parse interval string like "500ms", "90s", "3m", "1h", "1d" or raw seconds.
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();

    if let Some(millis) = s.strip_suffix("ms") {
        millis
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| format!("Invalid milliseconds: {}", millis))
    } else if let Some(hours) = s.strip_suffix('h') {
        hours
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("Invalid hours: {}", hours))
            .and_then(|h| scaled(h, 3600, &s))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("Invalid minutes: {}", minutes))
            .and_then(|m| scaled(m, 60, &s))
    } else if let Some(days) = s.strip_suffix('d') {
        days.trim()
            .parse::<u64>()
            .map_err(|_| format!("Invalid days: {}", days))
            .and_then(|d| scaled(d, 86400, &s))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>().map(Duration::from_secs).map_err(|_| {
            format!(
                "Invalid interval: {}. Use format like '90s', '3m', '1h'",
                s
            )
        })
    }
}

fn scaled(value: u64, unit_secs: u64, raw: &str) -> Result<Duration, String> {
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Interval too large: {}", raw))
}

/// Format an interval for display, using the largest unit that divides it.
pub fn format_interval(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 != 0 {
        return format!("{}ms", millis);
    }

    let secs = duration.as_secs();
    if secs >= 86400 && secs.is_multiple_of(86400) {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs.is_multiple_of(3600) {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs.is_multiple_of(60) {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Serde adapter so delays can be written as interval strings.
pub mod serde_interval {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_interval(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_interval(&raw).map_err(serde::de::Error::custom)
    }
}
