// ABOUTME: Video duration parsing and display formatting.
// ABOUTME: Accepts ISO-8601 (PT#H#M#S), HH:MM:SS, MM:SS, plain seconds and Go-style strings.

use once_cell::sync::Lazy;
use regex::Regex;

static ISO_8601_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$").unwrap()
});

/// Parses a duration string into seconds.
/// Supports:
/// - ISO-8601 durations like "PT1H2M3S" or "P1DT30M"
/// - Plain integers (seconds)
/// - HH:MM:SS and MM:SS
/// - Go-style durations like "1h30m", "45m", "2h"
pub fn parse_duration_seconds(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // ISO-shaped input never falls through to the looser parsers.
    if ISO_8601_RE.is_match(s) {
        return parse_iso8601(s);
    }

    if let Ok(secs) = s.parse::<u64>() {
        return Some(secs);
    }

    if s.contains(':') {
        return parse_colon_format(s);
    }

    parse_duration::parse(s).ok().map(|d| d.as_secs())
}

fn parse_iso8601(s: &str) -> Option<u64> {
    let caps = ISO_8601_RE.captures(s)?;
    // A bare "P" or "PT" carries no components.
    if caps.iter().skip(1).all(|m| m.is_none()) {
        return None;
    }
    let component = |i: usize, unit: u64| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<u64>().ok()?.checked_mul(unit),
            None => Some(0),
        }
    };
    let secs = match caps.get(4) {
        Some(m) => {
            let f = m.as_str().parse::<f64>().ok()?.round();
            if f >= u64::MAX as f64 {
                return None;
            }
            f as u64
        }
        None => 0,
    };
    checked_sum(&[component(1, 86_400)?, component(2, 3_600)?, component(3, 60)?, secs])
}

fn parse_colon_format(s: &str) -> Option<u64> {
    let parts: Vec<u64> = s
        .split(':')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    match parts.as_slice() {
        [mins, secs] => checked_sum(&[mins.checked_mul(60)?, *secs]),
        [hours, mins, secs] => {
            checked_sum(&[hours.checked_mul(3_600)?, mins.checked_mul(60)?, *secs])
        }
        _ => None,
    }
}

/// Sum of parts, `None` on overflow.
fn checked_sum(parts: &[u64]) -> Option<u64> {
    parts.iter().try_fold(0u64, |acc, &p| acc.checked_add(p))
}

/// Display form: `H:MM:SS` when an hour or longer, otherwise `M:SS`.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// Parse any supported duration and format it for display.
pub fn normalize_duration(s: &str) -> Option<String> {
    parse_duration_seconds(s).map(format_duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso8601() {
        assert_eq!(parse_duration_seconds("PT4M13S"), Some(253));
        assert_eq!(parse_duration_seconds("PT1H2M3S"), Some(3723));
        assert_eq!(parse_duration_seconds("P1DT30M"), Some(88_200));
        assert_eq!(parse_duration_seconds("pt45s"), Some(45));
        assert_eq!(parse_duration_seconds("PT12.6S"), Some(13));
        assert_eq!(parse_duration_seconds("PT"), None);
    }

    #[test]
    fn test_plain_and_colon() {
        assert_eq!(parse_duration_seconds("123"), Some(123));
        assert_eq!(parse_duration_seconds("01:02:03"), Some(3723));
        assert_eq!(parse_duration_seconds("05:30"), Some(330));
        assert_eq!(parse_duration_seconds("1:2:3:4"), None);
    }

    #[test]
    fn test_go_duration() {
        assert_eq!(parse_duration_seconds("1h30m"), Some(5400));
        assert_eq!(parse_duration_seconds("45m"), Some(2700));
    }

    #[test]
    fn test_overflowing_durations_are_rejected() {
        assert_eq!(parse_duration_seconds("PT9999999999999999H"), None);
        assert_eq!(parse_duration_seconds("P999999999999999999D"), None);
        assert_eq!(parse_duration_seconds("PT99999999999999999999S"), None);
        assert_eq!(parse_duration_seconds("9999999999999999:00:00"), None);
        assert_eq!(parse_duration_seconds("999999999999999999:00"), None);
        assert!(normalize_duration("PT9999999999999999H").is_none());
    }

    #[test]
    fn test_invalid_returns_none() {
        assert!(parse_duration_seconds("").is_none());
        assert!(parse_duration_seconds("not a duration").is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(253), "4:13");
        assert_eq!(format_duration(3723), "1:02:03");
        assert_eq!(format_duration(36_000), "10:00:00");
        assert_eq!(normalize_duration("PT1H").as_deref(), Some("1:00:00"));
    }
}
