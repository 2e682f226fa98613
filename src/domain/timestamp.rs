//! Timestamp formats shared by the report, the state log and the history file.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Timelike, Utc};

/// Pattern used by the terminal for log prefixes and report cells.
pub const TERMINAL_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Parse a terminal timestamp (`2024.03.01 14:05:09`), interpreted as UTC.
pub fn parse_terminal(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), TERMINAL_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// ISO-8601 in UTC with second precision and a `Z` suffix.
pub fn format_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an ISO-8601 timestamp. Offsets are converted to UTC; a value without
/// an offset is taken as UTC. Sub-second precision is discarded.
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    let cleaned = value.trim();
    if cleaned.is_empty() {
        return None;
    }
    let parsed = DateTime::parse_from_rfc3339(cleaned)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
                .map(|naive| naive.and_utc())
        })?;
    parsed.with_nanosecond(0)
}

/// Round half away from zero to `places` decimals. Values too large to scale
/// are returned unchanged.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / factor;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_terminal_format() {
        let dt = parse_terminal("2024.03.01 14:05:09").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap());
    }

    #[test]
    fn rejects_malformed_terminal_stamp() {
        assert!(parse_terminal("2024-03-01 14:05:09").is_none());
        assert!(parse_terminal("").is_none());
    }

    #[test]
    fn iso_uses_z_suffix_and_seconds() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
        assert_eq!(format_iso(&dt), "2024-03-01T14:05:09Z");
    }

    #[test]
    fn iso_round_trip_keeps_instant() {
        let dt = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_iso(&format_iso(&dt)), Some(dt));
    }

    #[test]
    fn iso_converts_offsets_to_utc() {
        let dt = parse_iso("2024-03-01T16:05:09+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap());
    }

    #[test]
    fn iso_without_offset_is_utc() {
        let dt = parse_iso("2024-03-01T14:05:09").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap());
    }

    #[test]
    fn iso_drops_fraction() {
        let dt = parse_iso("2024-03-01T14:05:09.750Z").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap());
    }

    #[test]
    fn iso_rejects_garbage() {
        assert!(parse_iso("yesterday").is_none());
        assert!(parse_iso("  ").is_none());
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.234567, 5), 1.23457);
        assert_eq!(round_to(-2.346, 2), -2.35);
        assert_eq!(round_to(-0.001, 2), 0.0);
    }

    #[test]
    fn rounding_keeps_huge_values_finite() {
        assert_eq!(round_to(1e308, 5), 1e308);
        assert_eq!(round_to(-1e308, 2), -1e308);
    }
}
