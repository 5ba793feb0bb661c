//! Field normalization applied to raw Rutube payloads before they touch
//! the catalog.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Renders a duration in seconds as `HH:MM:SS`. Missing or non-positive
/// durations come out as `00:00:00`.
pub fn format_duration(seconds: Option<i64>) -> String {
    let total = match seconds {
        Some(secs) if secs > 0 => secs,
        _ => return "00:00:00".to_string(),
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Parses an ISO-8601 publication timestamp, tolerating a `Z` suffix,
/// naive timestamps without an offset, and bare dates. Returns `None`
/// when the value is absent or unparsable.
pub fn parse_published_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let candidate = raw.replace('Z', "+00:00");

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&candidate) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(&candidate, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

/// Release year from a publication timestamp. An absent or unparsable
/// value falls back to the current calendar year.
pub fn extract_year(raw: Option<&str>) -> i32 {
    match parse_published_at(raw) {
        Some(parsed) => parsed.year(),
        None => Utc::now().year(),
    }
}

/// Parses human-formatted view counters like `"1,2 тыс"`, `"3 млн"` or
/// `"12.5k"` into an absolute count. The comma is treated as a decimal
/// separator. Anything unparsable yields 0.
pub fn parse_views_text(raw: &str) -> i64 {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    if cleaned.contains("тыс") || cleaned.contains('k') {
        scale(&cleaned, 1_000.0)
    } else if cleaned.contains("млн") || cleaned.contains('m') {
        scale(&cleaned, 1_000_000.0)
    } else {
        cleaned
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or(0)
    }
}

fn scale(text: &str, factor: f64) -> i64 {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    match numeric.parse::<f64>() {
        Ok(value) => (value * factor) as i64,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations_as_hms() {
        assert_eq!(format_duration(Some(3725)), "01:02:05");
        assert_eq!(format_duration(Some(59)), "00:00:59");
        assert_eq!(format_duration(Some(86399)), "23:59:59");
    }

    #[test]
    fn missing_duration_becomes_zero() {
        assert_eq!(format_duration(None), "00:00:00");
        assert_eq!(format_duration(Some(0)), "00:00:00");
        assert_eq!(format_duration(Some(-5)), "00:00:00");
    }

    #[test]
    fn parses_timestamps_with_and_without_offset() {
        let with_z = parse_published_at(Some("2024-03-10T12:00:00Z"));
        assert_eq!(with_z.map(|dt| dt.year()), Some(2024));

        let naive = parse_published_at(Some("2021-06-10T16:11:46"));
        assert_eq!(naive.map(|dt| dt.year()), Some(2021));

        let date_only = parse_published_at(Some("2019-01-02"));
        assert_eq!(date_only.map(|dt| dt.year()), Some(2019));
    }

    #[test]
    fn unparsable_timestamp_is_none() {
        assert_eq!(parse_published_at(None), None);
        assert_eq!(parse_published_at(Some("")), None);
        assert_eq!(parse_published_at(Some("вчера")), None);
    }

    #[test]
    fn year_falls_back_to_current_year() {
        assert_eq!(extract_year(Some("2022-12-31T10:00:00Z")), 2022);
        assert_eq!(extract_year(Some("мусор")), Utc::now().year());
        assert_eq!(extract_year(None), Utc::now().year());
    }

    #[test]
    fn parses_thousands_with_decimal_comma() {
        assert_eq!(parse_views_text("1,2 тыс"), 1200);
        assert_eq!(parse_views_text("5 тыс"), 5000);
        assert_eq!(parse_views_text("12.5k"), 12500);
    }

    #[test]
    fn parses_millions() {
        assert_eq!(parse_views_text("3 млн"), 3_000_000);
        assert_eq!(parse_views_text("1,5 млн"), 1_500_000);
        assert_eq!(parse_views_text("2M"), 2_000_000);
    }

    #[test]
    fn parses_plain_counts() {
        assert_eq!(parse_views_text("123"), 123);
        assert_eq!(parse_views_text("1 234 567"), 1_234_567);
    }

    #[test]
    fn garbage_views_become_zero() {
        assert_eq!(parse_views_text(""), 0);
        assert_eq!(parse_views_text("мусор"), 0);
    }
}
